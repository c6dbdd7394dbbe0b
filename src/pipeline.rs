//! Fetch → filter → dedup → format → send
//!
//! [`plan`] is the pure part: given the feed snapshot, the current time and
//! the dedup state it decides what to send. [`Pipeline::run_once`] wraps it
//! with the I/O and commits the dedup state only after a successful send.

use crate::dedup::DedupStore;
use crate::feed::EventSource;
use crate::filter::{filter_high_impact, ScheduledEvent};
use crate::formatter::{fetch_error_message, MessageFormatter, ALL_NOTIFIED};
use crate::notify::MessageSink;
use crate::types::{CalendarEvent, NotificationRecord};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// What a pass should send
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// `None` when an update pass finds nothing new
    pub message: Option<String>,
    /// Identifiers to mark once the message is delivered
    pub pending_ids: Vec<String>,
    /// Qualifying events selected for this message
    pub selected: usize,
}

/// Decide what to send.
///
/// Events the store has already seen are never included. An initial pass
/// always produces a message under the summary banner, falling back to a
/// sentinel when nothing is left to send. Later passes use the update banner
/// and stay silent when there is nothing new.
pub fn plan(
    events: Vec<CalendarEvent>,
    now: DateTime<Utc>,
    store: &dyn DedupStore,
    formatter: &MessageFormatter,
    is_initial_run: bool,
) -> Plan {
    let upcoming = filter_high_impact(events, now);
    let total = upcoming.len();

    let selected: Vec<ScheduledEvent> = upcoming
        .into_iter()
        .filter(|s| store.is_new(s.event.id.as_deref()))
        .collect();
    if selected.len() < total {
        debug!("Suppressed {} already-notified events", total - selected.len());
    }

    // An empty feed on an initial pass still renders the "no events" sentinel
    if selected.is_empty() && (total > 0 || !is_initial_run) {
        return Plan {
            message: is_initial_run.then(|| ALL_NOTIFIED.to_string()),
            pending_ids: Vec::new(),
            selected: 0,
        };
    }

    let offset = formatter.config().local_offset_hours;
    let records: Vec<NotificationRecord> = selected
        .iter()
        .map(|s| NotificationRecord::from_event(&s.event, s.scheduled, offset))
        .collect();

    let rendered = formatter.render(&records, is_initial_run);
    let pending_ids = records
        .iter()
        .take(rendered.shown)
        .filter_map(|r| r.id.clone())
        .collect();

    Plan {
        message: Some(rendered.text),
        pending_ids,
        selected: records.len(),
    }
}

/// Outcome of one pass, for drivers to report
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Text sent (or attempted); `None` if there was nothing to send
    pub message: Option<String>,
    pub delivered: bool,
    pub selected: usize,
    pub fetch_failed: bool,
}

impl RunReport {
    /// True unless a fetch or a send failed
    pub fn is_success(&self) -> bool {
        !self.fetch_failed && (self.message.is_none() || self.delivered)
    }
}

pub struct Pipeline {
    source: Box<dyn EventSource>,
    sink: Box<dyn MessageSink>,
    formatter: MessageFormatter,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn EventSource>,
        sink: Box<dyn MessageSink>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            source,
            sink,
            formatter,
        }
    }

    pub fn sink(&self) -> &dyn MessageSink {
        self.sink.as_ref()
    }

    /// Run one full pass at the current time
    pub async fn run_once(&self, store: &mut dyn DedupStore, is_initial_run: bool) -> RunReport {
        self.run_at(store, is_initial_run, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        store: &mut dyn DedupStore,
        is_initial_run: bool,
        now: DateTime<Utc>,
    ) -> RunReport {
        let events = match self.source.fetch_events().await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to fetch calendar: {}", e);
                let text = fetch_error_message(&e.to_string());
                let delivered = self.sink.send(&text).await;
                return RunReport {
                    message: Some(text),
                    delivered,
                    selected: 0,
                    fetch_failed: true,
                };
            }
        };

        let plan = plan(events, now, &*store, &self.formatter, is_initial_run);
        let Some(text) = plan.message else {
            info!("No new high-impact events");
            return RunReport {
                message: None,
                delivered: false,
                selected: 0,
                fetch_failed: false,
            };
        };

        info!("Sending {} high-impact events", plan.selected);
        let delivered = self.sink.send(&text).await;
        if delivered {
            for id in &plan.pending_ids {
                store.mark_sent(Some(id));
            }
            if let Err(e) = store.flush() {
                warn!("Failed to persist sent events: {}", e);
            }
        }

        RunReport {
            message: Some(text),
            delivered,
            selected: plan.selected,
            fetch_failed: false,
        }
    }
}
