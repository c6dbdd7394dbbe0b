//! Configuration management
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! `FFN_`-prefixed environment variables (`FFN_SERVER__PORT=8080`), then the
//! plain `BOT_TOKEN`, `CHAT_ID` and `PORT` variables used by hosting platforms.

use crate::error::{BotError, Result};
use ::config::{Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

/// Telegram Bot API credentials and endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Numeric chat id or `@channelusername`
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_api_base(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

/// Resolved credentials, only obtainable when both values are present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Landing page scanned for the versioned feed URL
    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,
    /// Unversioned feed URL, also the fallback
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_true")]
    pub resolve_version: bool,
    #[serde(default = "default_landing_timeout")]
    pub landing_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            calendar_url: default_calendar_url(),
            feed_url: default_feed_url(),
            resolve_version: true,
            landing_timeout_secs: default_landing_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    /// Maximum event blocks per message
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Character budget for the event body, continuation notice included
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Fixed shift from feed time to local time (not DST-aware)
    #[serde(default = "default_local_offset")]
    pub local_offset_hours: i64,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            max_chars: default_max_chars(),
            local_offset_hours: default_local_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Send the "bot started" message after the startup pass
    #[serde(default = "default_true")]
    pub startup_notice: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            startup_notice: true,
        }
    }
}

/// Polling command bot settings
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_survey_url")]
    pub survey_url: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            survey_url: default_survey_url(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_send_timeout() -> u64 {
    10
}

fn default_calendar_url() -> String {
    "https://www.forexfactory.com/calendar".to_string()
}

fn default_feed_url() -> String {
    "https://nfs.faireconomy.media/ff_calendar_thisweek.json".to_string()
}

fn default_landing_timeout() -> u64 {
    12
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_max_events() -> usize {
    12
}

fn default_max_chars() -> usize {
    3800
}

fn default_local_offset() -> i64 {
    6
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_survey_url() -> String {
    "https://bitpathforexnews.featurebase.app/survey".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: &str) -> Result<Self> {
        // .env is optional; real environment variables win over it
        let _ = dotenvy::dotenv();

        let mut config: Config = ::config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("FFN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply the plain hosting-platform variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| BotError::Config(format!("Invalid PORT {:?}: {}", port, e)))?;
        }
        Ok(())
    }

    /// Both credentials, or the first missing one
    pub fn credentials(&self) -> Result<Credentials> {
        let bot_token = present(&self.telegram.bot_token).ok_or(BotError::ConfigMissing("BOT_TOKEN"))?;
        let chat_id = present(&self.telegram.chat_id).ok_or(BotError::ConfigMissing("CHAT_ID"))?;
        Ok(Credentials {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
