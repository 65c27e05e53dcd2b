use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use scandrop_core::{Credentials, FilterConfig};

use crate::pipeline::RetryPolicy;

/// Configuration for the scandrop watcher daemon.
///
/// Constructed once at startup and passed by reference; nothing reads
/// settings from ambient global state.
#[derive(Parser, Debug, Clone)]
#[command(name = "scandrop")]
#[command(about = "Watches a folder and moves newly created files to remote storage")]
pub struct Config {
    /// Directory to watch for new files
    #[arg(long, default_value = "./toupload", env = "SCANDROP_WATCH_PATH")]
    pub watch_path: PathBuf,

    /// Watch subdirectories as well
    #[arg(
        long,
        default_value_t = true,
        env = "SCANDROP_RECURSIVE",
        action = clap::ArgAction::Set
    )]
    pub recursive: bool,

    /// Base-name globs a file must match (comma-separated, empty = all)
    #[arg(long, env = "SCANDROP_INCLUDE", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Base-name globs that disqualify a file (comma-separated)
    #[arg(
        long,
        default_value = ".*,*.lock,*.tmp,*.git",
        env = "SCANDROP_EXCLUDE",
        value_delimiter = ','
    )]
    pub exclude: Vec<String>,

    /// Match patterns without regard to case
    #[arg(long, default_value_t = false, env = "SCANDROP_CASE_INSENSITIVE")]
    pub case_insensitive: bool,

    /// Base URL of the remote store
    #[arg(long, env = "SCANDROP_BASE_URL")]
    pub base_url: String,

    /// OAuth2 client id
    #[arg(long, env = "SCANDROP_CLIENT_ID")]
    pub client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "SCANDROP_CLIENT_SECRET")]
    pub client_secret: String,

    /// Upload account username (should be write-only)
    #[arg(long, env = "SCANDROP_USERNAME")]
    pub username: String,

    /// Upload account password
    #[arg(long, env = "SCANDROP_PASSWORD")]
    pub password: String,

    /// Unlock secret for the account encryption keypair (encrypted targets only)
    #[arg(long, env = "SCANDROP_KEYPAIR_SECRET")]
    pub keypair_secret: Option<String>,

    /// Destination directory on the remote store
    #[arg(long, default_value = "/scans/", env = "SCANDROP_TARGET")]
    pub remote_target: String,

    /// Number of concurrent upload workers
    #[arg(long, default_value_t = 1, env = "SCANDROP_WORKERS")]
    pub workers: usize,

    /// Upload attempts per file before the error is treated as fatal
    #[arg(long, default_value_t = 3, env = "SCANDROP_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Delay between upload attempts, in milliseconds
    #[arg(long, default_value_t = 500, env = "SCANDROP_RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: u64,
}

impl Config {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            case_sensitive: !self.case_insensitive,
            ignore_directories: true,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            keypair_secret: self.keypair_secret.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}
