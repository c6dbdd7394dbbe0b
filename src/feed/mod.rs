//! Economic calendar feed
//!
//! Fetches the weekly JSON calendar, optionally resolving the versioned URL
//! from the landing page first.

mod version;

#[cfg(test)]
mod tests;

pub use version::VersionResolver;

use crate::config::FeedConfig;
use crate::error::{BotError, Result};
use crate::types::CalendarEvent;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("accept-language", "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("referer", "https://www.google.com/"),
    ("dnt", "1"),
];

/// Anything that can produce the current calendar snapshot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<CalendarEvent>>;
}

/// HTTP client for the Forex Factory feed
#[derive(Clone)]
pub struct FeedClient {
    http: Client,
    config: FeedConfig,
    resolver: VersionResolver,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .default_headers(browser_headers())
            .build()?;
        let resolver = VersionResolver::new(&config.feed_url)?;

        Ok(Self {
            http,
            config,
            resolver,
        })
    }

    /// Feed URL to use for this pass. Never fails: every problem with the
    /// landing page ends in the unversioned URL.
    pub async fn resolve_feed_url(&self) -> String {
        if !self.config.resolve_version {
            return self.resolver.fallback_url().to_string();
        }

        info!("Resolving feed version from {}", self.config.calendar_url);
        match self.landing_page().await {
            Ok(html) => match self.resolver.extract_token(&html) {
                Some(token) => {
                    info!("Found feed version {}", token);
                    self.resolver.versioned_url(token)
                }
                None => {
                    warn!("Feed version not found, using unversioned URL");
                    self.resolver.fallback_url().to_string()
                }
            },
            Err(e) => {
                error!("Failed to load calendar page: {}", e);
                self.resolver.fallback_url().to_string()
            }
        }
    }

    async fn landing_page(&self) -> Result<String> {
        let resp = self
            .http
            .get(&self.config.calendar_url)
            .timeout(Duration::from_secs(self.config.landing_timeout_secs))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BotError::Status {
                url: self.config.calendar_url.clone(),
                status: resp.status(),
            });
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl EventSource for FeedClient {
    async fn fetch_events(&self) -> Result<Vec<CalendarEvent>> {
        let url = self.resolve_feed_url().await;
        info!("Fetching events from {}", url);

        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(self.config.fetch_timeout_secs))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::Status { url, status });
        }

        let body = resp.text().await?;
        let events = decode_events(&body)?;
        debug!("Decoded {} events", events.len());
        Ok(events)
    }
}

/// Decode a JSON array of events. Entries that fail to decode are skipped so
/// one bad record cannot sink the batch; a body that is not an array is an
/// error.
pub fn decode_events(body: &str) -> Result<Vec<CalendarEvent>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(body)?;

    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<CalendarEvent>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping malformed event: {}", e);
                None
            }
        })
        .collect())
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }
    headers
}
