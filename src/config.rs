use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "https://vault-backend-susi.onrender.com/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: default_session_file(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads `VAULT_API_URL`, `VAULT_SESSION_FILE` and `VAULT_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults per key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let timeout = match lookup("VAULT_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map(Duration::from_secs).unwrap_or_else(|_| {
                warn!(value = %raw, "VAULT_TIMEOUT_SECS is not a number, using default");
                defaults.timeout
            }),
            None => defaults.timeout,
        };

        Self {
            api_url: lookup("VAULT_API_URL").unwrap_or(defaults.api_url),
            session_file: lookup("VAULT_SESSION_FILE").map(PathBuf::from).unwrap_or(defaults.session_file),
            timeout,
        }
    }
}

pub fn default_session_file() -> PathBuf {
    ProjectDirs::from("com", "vault", "vault")
        .map(|dirs| dirs.config_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".vault-session.json"))
}
