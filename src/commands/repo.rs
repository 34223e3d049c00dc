use anyhow::Result;
use clap::Subcommand;
use vault_client::models::{NewRepository, Repository};
use vault_client::stores::RepositoryStore;
use vault_client::{ApiClient, Route};

use super::{enter, fail, separator};

#[derive(Subcommand)]
pub enum RepoCommand {
    /// List your repositories
    List {
        /// List everyone's public repositories instead
        #[arg(long)]
        public: bool,
    },
    /// Create a repository
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// List the files stored in a repository
    Files { repo_id: i64 },
    /// Show a repository's commit history
    Commits { repo_id: i64 },
}

pub fn run(api: &ApiClient, cmd: RepoCommand) -> Result<()> {
    enter(api, Route::Dashboard)?;
    let mut store = RepositoryStore::new(api);

    match cmd {
        RepoCommand::List { public } => {
            let result =
                if public { store.fetch_public_repositories() } else { store.fetch_repositories() };
            result.map_err(|e| fail(&e, store.error.as_deref()))?;
            let repos = if public { &store.public_repositories } else { &store.repositories };
            print_repositories(repos);
        }
        RepoCommand::Create { name, description, public } => {
            let body = NewRepository { name: &name, description: description.as_deref(), is_public: public };
            let created =
                store.create_repository(&body).map_err(|e| fail(&e, store.error.as_deref()))?;
            println!("Created repository #{} {}.", created.id, created.name);
            println!();
            print_repositories(&store.repositories);
        }
        RepoCommand::Files { repo_id } => {
            store.fetch_repository_files(repo_id).map_err(|e| fail(&e, store.error.as_deref()))?;
            if store.repo_files.is_empty() {
                println!("Repository #{repo_id} has no files.");
            }
            for f in &store.repo_files {
                println!("{:<50} {:>10}", f.file_path, f.size);
            }
        }
        RepoCommand::Commits { repo_id } => {
            store.fetch_commits(repo_id).map_err(|e| fail(&e, store.error.as_deref()))?;
            if store.commits.is_empty() {
                println!("Repository #{repo_id} has no commits.");
            }
            for c in &store.commits {
                println!("{:<10} {:<20} {}", short_hash(&c.hash), c.author_name, first_line(&c.message));
            }
        }
    }

    Ok(())
}

fn print_repositories(repos: &[Repository]) {
    if repos.is_empty() {
        println!("No repositories yet. Create one with `vault repo create <name>`.");
        return;
    }

    println!("{:<6} {:<30} {:<12} Description", "ID", "Name", "Language");
    separator(80);
    for r in repos {
        println!(
            "{:<6} {:<30} {:<12} {}",
            r.id,
            r.name,
            r.language.as_deref().unwrap_or("—"),
            r.description.as_deref().unwrap_or("")
        );
    }
}

pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}
