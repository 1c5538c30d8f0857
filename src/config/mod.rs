//! # Configuration Management
//!
//! Gatebot is configured from a single TOML file with a small number of
//! sections:
//!
//! - [`BotConfig`] - bot identity and presentation
//! - [`TelegramConfig`] - API token and polling behavior
//! - `[credentials]` - the username -> password table checked at login
//! - [`LoggingConfig`] - log level, optional log file, optional security log
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "Gatebot"
//!
//! [telegram]
//! token = ""              # prefer the TELEGRAM_BOT_TOKEN env var
//! poll_timeout_seconds = 30
//! request_timeout_seconds = 40
//!
//! [credentials]
//! admin = "admin123"
//! user1 = "pass123"
//!
//! [logging]
//! level = "info"
//! file = "gatebot.log"
//! security_file = "gatebot-security.log"
//! ```
//!
//! The API token may live in the config file, but the `TELEGRAM_BOT_TOKEN`
//! environment variable always wins so tokens can stay out of committed
//! files. A missing token is a fatal startup condition: the process refuses
//! to enter its polling loop without one.
//!
//! Credentials are held in memory as plain strings and compared without
//! hashing. This mirrors the deliberately simple trust model of the bot; do
//! not store valuable secrets in this table.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::fs;

/// Environment variable consulted before `[telegram].token`.
pub const TOKEN_ENV_VAR: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    /// Username -> password table. Checked verbatim at login time.
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. Usually left empty in favor of the env var.
    #[serde(default)]
    pub token: String,
    /// Long-poll timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u32,
    /// Outer HTTP timeout per API call. Must exceed the poll timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_request_timeout() -> u32 {
    40
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Separate audit log receiving only `target: "security"` records
    /// (logins, failed attempts, denials, logouts).
    #[serde(default)]
    pub security_file: Option<String>,
}

impl TelegramConfig {
    /// Resolve the effective bot token: environment first, then config.
    ///
    /// Returns an operator-facing error when neither source provides one.
    pub fn resolve_token(&self) -> Result<String> {
        if let Ok(tok) = std::env::var(TOKEN_ENV_VAR) {
            if !tok.trim().is_empty() {
                return Ok(tok.trim().to_string());
            }
        }
        if !self.token.trim().is_empty() {
            return Ok(self.token.trim().to_string());
        }
        Err(anyhow!(
            "No Telegram bot token configured. Set the {} environment variable \
             (export {}='your-token-here') or the [telegram].token config field.",
            TOKEN_ENV_VAR,
            TOKEN_ENV_VAR
        ))
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut credentials = HashMap::new();
        credentials.insert("admin".to_string(), "admin123".to_string());
        credentials.insert("user1".to_string(), "pass123".to_string());
        credentials.insert("demo".to_string(), "demo123".to_string());

        Config {
            bot: BotConfig {
                name: "Gatebot".to_string(),
            },
            telegram: TelegramConfig {
                token: String::new(),
                poll_timeout_seconds: default_poll_timeout(),
                request_timeout_seconds: default_request_timeout(),
            },
            credentials,
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("gatebot.log".to_string()),
                security_file: Some("gatebot-security.log".to_string()),
            },
        }
    }
}
