//! Version token discovery
//!
//! The calendar landing page links the JSON feed with a cache-busting
//! `?version=<32 hex digits>` query. Scraping it is best-effort: any miss
//! falls back to the unversioned URL.

use crate::error::{BotError, Result};
use regex::Regex;

/// Finds the versioned feed URL inside landing-page markup
#[derive(Debug, Clone)]
pub struct VersionResolver {
    pattern: Regex,
    feed_url: String,
}

impl VersionResolver {
    /// `feed_url` is the unversioned feed, e.g.
    /// `https://nfs.faireconomy.media/ff_calendar_thisweek.json`
    pub fn new(feed_url: &str) -> Result<Self> {
        let feed_url = feed_url.trim_end_matches('?').to_string();
        let file_name = feed_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BotError::Config(format!("Invalid feed URL: {}", feed_url)))?;

        let pattern = Regex::new(&format!(
            r"(?i){}\?version=([a-f0-9]{{32}})",
            regex::escape(file_name)
        ))
        .map_err(|e| BotError::Config(format!("Invalid version pattern: {}", e)))?;

        Ok(Self { pattern, feed_url })
    }

    /// The 32-hex-digit token, if the markup contains one
    pub fn extract_token<'a>(&self, html: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn versioned_url(&self, token: &str) -> String {
        format!("{}?version={}", self.feed_url, token)
    }

    pub fn fallback_url(&self) -> &str {
        &self.feed_url
    }

    /// Versioned URL if a token is present, otherwise the fallback
    pub fn resolve(&self, html: &str) -> String {
        match self.extract_token(html) {
            Some(token) => self.versioned_url(token),
            None => self.feed_url.clone(),
        }
    }
}
