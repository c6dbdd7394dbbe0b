//! High-impact event selection

use crate::types::CalendarEvent;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

/// Parse a feed timestamp, accepting a trailing `Z` as UTC and a missing
/// seconds field
pub fn parse_event_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized)
        .or_else(|_| DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z"))
        .ok()
}

/// An event that passed the filter, with its parsed timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub event: CalendarEvent,
    pub scheduled: DateTime<FixedOffset>,
}

/// Keep high-impact events scheduled strictly after `now`, in feed order.
///
/// Events without a usable date are dropped and logged at debug level.
pub fn filter_high_impact(events: Vec<CalendarEvent>, now: DateTime<Utc>) -> Vec<ScheduledEvent> {
    events
        .into_iter()
        .filter(CalendarEvent::is_high_impact)
        .filter_map(|event| {
            let Some(scheduled) = event.date.as_deref().and_then(parse_event_time) else {
                debug!(
                    "Skipping event with unusable date {:?}: {:?}",
                    event.date, event.title
                );
                return None;
            };
            (scheduled.with_timezone(&Utc) > now).then_some(ScheduledEvent { event, scheduled })
        })
        .collect()
}
