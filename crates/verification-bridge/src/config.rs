//! Configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,

    /// Handle directory storage configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Verification code configuration
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-handle attempt limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather
    pub bot_token: String,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Long polling timeout for getUpdates
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,

    /// Timeout for every Bot API request; must exceed `poll_timeout`
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Path to the handle directory file
    #[serde(default = "default_directory_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, the directory is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How long an issued code stays valid
    #[serde(default = "default_code_ttl", with = "humantime_serde")]
    pub code_ttl: Duration,

    /// How often expired codes are dropped from memory
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Code requests per handle per minute
    #[serde(default = "default_send_per_minute")]
    pub send_per_minute: u32,

    /// Verification attempts per handle per minute
    #[serde(default = "default_verify_per_minute")]
    pub verify_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: default_directory_path(),
            persist: true,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            code_ttl: default_code_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            send_per_minute: default_send_per_minute(),
            verify_per_minute: default_verify_per_minute(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(40)
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("data/chat_ids.json")
}

fn default_true() -> bool {
    true
}

fn default_code_ttl() -> Duration {
    code_ledger::DEFAULT_CODE_TTL
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_send_per_minute() -> u32 {
    3
}

fn default_verify_per_minute() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
