use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Base URL baked in at build time; config file and `--api-url` override it.
pub const BUILD_API_URL: Option<&str> = option_env!("VETSOC_API_URL");

const FALLBACK_API_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "vetsoc", about = "Veterans Society community client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and persist the access token
    Login { username: String, password: String },
    /// Clear the persisted session
    Logout,
    /// Show the current session
    Whoami,
    /// Show the feed, optionally filtered by topic
    Feed {
        #[arg(long = "topic")]
        topics: Vec<String>,
    },
    /// Toggle your like on a post
    Like { post_id: String },
    /// List comments on a post
    Comments { post_id: String },
    /// Add a comment to a post
    Comment { post_id: String, text: String },
    /// Delete a post (author or admin)
    DeletePost { post_id: String },
    /// Show your fitness tasks and progress
    Fitness,
    /// Toggle completion of a fitness task
    FitnessToggle { task_id: String },
    /// Add a fitness task
    FitnessAdd { description: String },
    /// Delete a fitness task
    FitnessDelete { task_id: String },
    /// Show today's motivational quote
    Quote,
    /// Verify an email address using the token from the verification link
    VerifyEmail {
        #[arg(long)]
        token: Option<String>,
    },
    /// Request a new verification email
    ResendVerification { email: String },
    /// Administrator actions
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    DeleteUser { username: String },
    DeleteGroup { group_id: String },
    DeleteGroupPost { group_id: String, post_id: String },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
    pub feed: FeedConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub notice_secs: u64,
    pub redirect_delay_secs: u64,
    pub dedup_window_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub topics: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: BUILD_API_URL.unwrap_or(FALLBACK_API_URL).to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_secs: 3,
            redirect_delay_secs: 3,
            dedup_window_ms: 2000,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            topics: ["Mental Health", "Employment", "Substance", "Shelter"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref url) = cli.api_url {
            config.api.base_url = url.clone();
        }

        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("vetsoc.db"));
        }

        url::Url::parse(&config.api.base_url)
            .map_err(|e| anyhow::anyhow!("invalid api base_url {:?}: {}", config.api.base_url, e))?;

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".vetsoc")
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("vetsoc.db"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.ui.notice_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_secs(self.ui.redirect_delay_secs)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.ui.dedup_window_ms)
    }
}
