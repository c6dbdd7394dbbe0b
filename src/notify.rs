//! Telegram notifications
//!
//! Delivery failures never propagate: callers get a `bool` and the details
//! go to the log. The bot token is part of the request URL, so it is kept
//! out of every log line.

use crate::config::{Credentials, TelegramConfig};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const LOGGED_BODY_CHARS: usize = 200;

/// Destination for rendered messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver `text` to the configured chat
    async fn send(&self, text: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot API client for `sendMessage`
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_base: String,
    credentials: Option<Credentials>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, credentials: Option<Credentials>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// A notifier without credentials; every send fails immediately
    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            api_base: String::new(),
            credentials: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send to an explicit chat, e.g. a reply to whoever issued a command
    pub async fn send_to(&self, chat_id: &str, text: &str) -> bool {
        let Some(creds) = &self.credentials else {
            tracing::error!("Cannot send Telegram message: bot token or chat id missing");
            return false;
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, creds.bot_token);
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        match self.http.post(&url).json(&request).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!("Telegram message delivered to {}", chat_id);
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let body: String = body.chars().take(LOGGED_BODY_CHARS).collect();
                tracing::error!("Telegram API error {}: {}", status, body);
                false
            }
            Err(e) => {
                tracing::error!("Failed to send Telegram message: {}", e.without_url());
                false
            }
        }
    }
}

#[async_trait]
impl MessageSink for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        match &self.credentials {
            Some(creds) => self.send_to(&creds.chat_id, text).await,
            None => {
                tracing::error!("Cannot send Telegram message: bot token or chat id missing");
                false
            }
        }
    }
}
