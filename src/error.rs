//! Error types for the notifier

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting is absent
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// Transport failure or timeout. The request URL is stripped on
    /// construction because Telegram URLs embed the bot token.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        BotError::Http(e.without_url())
    }
}

impl From<::config::ConfigError> for BotError {
    fn from(e: ::config::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}
