mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vault_client::storage::FileStore;
use vault_client::{ApiClient, Config, Session};

use commands::git::GitCommand;
use commands::repo::RepoCommand;

#[derive(Parser)]
#[command(name = "vault", version, about = "Command-line client for the Vault feed and repository service")]
struct Cli {
    /// Vault API base URL (overrides VAULT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file holding the stored tokens (overrides VAULT_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the landing page and where you can go from here
    Home,
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored tokens
    Logout,
    /// Check the stored token against the server
    Verify,
    /// Show a page of the feed
    Feed {
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Publish a post
    Post { title: String, content: String },
    /// Like or unlike a post
    Like { post_id: i64 },
    /// Comment on a post
    Comment { post_id: i64, content: String },
    /// List the comments on a post
    Comments { post_id: i64 },
    /// Repositories on your dashboard
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Commits and files in the repository manager
    #[command(subcommand)]
    Git(GitCommand),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    let session = Session::init(FileStore::open(config.session_file.clone()));
    let api = ApiClient::new(&config, session);

    match cli.command.unwrap_or(Command::Home) {
        Command::Home => commands::home::run(&api),
        Command::Login { email, password } => commands::auth::login(&api, email, password),
        Command::Signup { first_name, last_name, email, password } => {
            commands::auth::signup(&api, first_name, last_name, email, password)
        }
        Command::Logout => commands::auth::logout(&api),
        Command::Verify => commands::auth::verify(&api),
        Command::Feed { page } => commands::feed::show(&api, page),
        Command::Post { title, content } => commands::feed::post(&api, &title, &content),
        Command::Like { post_id } => commands::feed::like(&api, post_id),
        Command::Comment { post_id, content } => commands::feed::comment(&api, post_id, &content),
        Command::Comments { post_id } => commands::feed::comments(&api, post_id),
        Command::Repo(cmd) => commands::repo::run(&api, cmd),
        Command::Git(cmd) => commands::git::run(&api, cmd),
    }
}
