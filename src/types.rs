//! Core types shared across the pipeline

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Expected market impact as reported by the calendar feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Case-insensitive parse. Feed values such as "Holiday" map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Impact::Low),
            "medium" => Some(Impact::Medium),
            "high" => Some(Impact::High),
            _ => None,
        }
    }
}

/// One entry of the economic calendar feed, as decoded from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Currency code as the upstream feed names it
    #[serde(default)]
    pub country: Option<String>,
    /// Same meaning as `country`; some feeds send either or both
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub impact: String,
    /// ISO-8601 timestamp in the source's time zone
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub forecast: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl CalendarEvent {
    pub fn impact_level(&self) -> Option<Impact> {
        Impact::parse(&self.impact)
    }

    pub fn is_high_impact(&self) -> bool {
        self.impact_level() == Some(Impact::High)
    }

    /// `currency` if present and non-blank, otherwise `country`
    pub fn currency_code(&self) -> Option<&str> {
        non_empty(self.currency.as_deref()).or_else(|| non_empty(self.country.as_deref()))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// The fields needed to render one event block
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: Option<String>,
    /// Local time label, `dd/mm/YYYY HH:MM`
    pub when: String,
    pub country: String,
    pub title: String,
    pub forecast: String,
    pub previous: String,
}

impl NotificationRecord {
    /// Build a record from an event whose timestamp has already been parsed.
    ///
    /// The shift is a fixed number of hours applied to the source wall-clock
    /// time. It approximates US Eastern to Italian time and ignores DST.
    pub fn from_event(
        event: &CalendarEvent,
        scheduled: DateTime<FixedOffset>,
        offset_hours: i64,
    ) -> Self {
        let local = scheduled + Duration::hours(offset_hours);
        Self {
            id: event.id.clone(),
            when: local.format("%d/%m/%Y %H:%M").to_string(),
            country: event.currency_code().unwrap_or("??").to_string(),
            title: non_empty(event.title.as_deref())
                .unwrap_or("Evento sconosciuto")
                .to_string(),
            forecast: non_empty(event.forecast.as_deref()).unwrap_or("-").to_string(),
            previous: non_empty(event.previous.as_deref()).unwrap_or("-").to_string(),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
