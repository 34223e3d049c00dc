use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use vault_client::models::RepositoryFile;
use vault_client::stores::GitStore;
use vault_client::{ApiClient, Route};

use super::repo::{first_line, short_hash};
use super::{enter, fail, separator};

#[derive(Subcommand)]
pub enum GitCommand {
    /// Show the commit history of a repository
    Log { repo_id: i64 },
    /// Show one commit
    Show {
        hash: String,
        /// Also list the files the commit touched
        #[arg(long)]
        files: bool,
    },
    /// Commit local files to a repository
    Commit {
        repo_id: i64,
        #[arg(short, long)]
        message: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the working files of a repository
    Files {
        repo_id: i64,
        /// Only files whose path starts with this prefix
        #[arg(long)]
        path: Option<String>,
        /// Print totals and a breakdown by extension
        #[arg(long)]
        stats: bool,
    },
    /// Upload one file
    Upload {
        repo_id: i64,
        file: PathBuf,
        /// Destination path inside the repository
        #[arg(long)]
        path: Option<String>,
    },
    /// Delete a file
    Rm { repo_id: i64, file_name: String, file_path: String },
    /// Download a file
    Download {
        repo_id: i64,
        file_name: String,
        file_path: String,
        /// Where to write it (defaults to the file name)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print a download link instead of fetching the bytes
        #[arg(long)]
        url: bool,
    },
}

pub fn run(api: &ApiClient, cmd: GitCommand) -> Result<()> {
    enter(api, Route::GitRepositoryManager)?;
    let mut store = GitStore::new(api);

    match cmd {
        GitCommand::Log { repo_id } => {
            let commits = store.fetch_commit_history(repo_id).map_err(|e| fail(&e, None))?;
            if commits.is_empty() {
                println!("No commits yet.");
            }
            for c in commits {
                println!(
                    "{:<10} {:<20} {:<20} {}",
                    short_hash(&c.hash),
                    c.created_at,
                    c.author_name,
                    first_line(&c.message)
                );
            }
        }
        GitCommand::Show { hash, files } => {
            let commit = store.fetch_commit(&hash).map_err(|e| fail(&e, None))?.clone();
            println!("commit {}", commit.hash);
            println!("Author: {}", commit.author_name);
            println!("Date:   {}", commit.created_at);
            println!();
            for line in commit.message.lines() {
                println!("    {line}");
            }
            if files {
                println!();
                for path in store.fetch_commit_files(&hash).map_err(|e| fail(&e, None))? {
                    println!("  {path}");
                }
            }
        }
        GitCommand::Commit { repo_id, message, files } => {
            store.create_commit(repo_id, &message, &files[..]).map_err(|e| fail(&e, store.error.as_deref()))?;
            println!("Committed {} file(s) to repository #{repo_id}.", files.len());
            if let Some(latest) = store.commits.first() {
                println!("Latest: {} {}", short_hash(&latest.hash), first_line(&latest.message));
            }
        }
        GitCommand::Files { repo_id, path, stats } => {
            store.fetch_repository_files(repo_id).map_err(|e| fail(&e, None))?;
            let files = match &path {
                Some(prefix) => store.get_files_by_path(prefix),
                None => store.repository_files.iter().collect(),
            };
            print_files(&files);
            if stats {
                print_stats(&store);
            }
        }
        GitCommand::Upload { repo_id, file, path } => {
            let target = path.unwrap_or_default();
            store
                .add_file_to_repository(repo_id, &file, &target)
                .map_err(|e| fail(&e, store.error.as_deref()))?;
            println!("Uploaded {}.", file.display());
            print_files(&store.repository_files.iter().collect::<Vec<_>>());
        }
        GitCommand::Rm { repo_id, file_name, file_path } => {
            store
                .delete_file_from_repository(repo_id, &file_name, &file_path)
                .map_err(|e| fail(&e, store.error.as_deref()))?;
            println!("Deleted {file_name}. {} file(s) remain.", store.repository_files.len());
        }
        GitCommand::Download { repo_id, file_name, file_path, out, url } => {
            if url {
                let link = store
                    .get_file_download_url(repo_id, &file_name, &file_path)
                    .map_err(|e| fail(&e, store.error.as_deref()))?;
                println!("{link}");
                return Ok(());
            }

            let bytes = store
                .download_file(repo_id, &file_name, &file_path)
                .map_err(|e| fail(&e, store.error.as_deref()))?;
            let out = out.unwrap_or_else(|| PathBuf::from(&file_name));
            std::fs::write(&out, &bytes)?;
            println!("Saved {} ({}).", out.display(), format_size(bytes.len() as u64));
        }
    }

    Ok(())
}

fn print_files(files: &[&RepositoryFile]) {
    if files.is_empty() {
        println!("No files.");
        return;
    }
    println!("{:<50} {:>10}  Updated", "Path", "Size");
    separator(80);
    for f in files {
        println!(
            "{:<50} {:>10}  {}",
            f.file_path,
            format_size(f.size),
            f.updated_at.as_deref().unwrap_or("")
        );
    }
}

fn print_stats(store: &GitStore<'_>) {
    let stats = store.get_file_stats();
    println!();
    println!("{} file(s), {} total", stats.total_files, format_size(stats.total_size));
    for (ext, count) in &stats.file_types {
        println!("  .{ext:<10} {count}");
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor().min(3.0) as i32;
    let value = bytes as f64 / 1024f64.powi(exp);
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[exp as usize])
}
