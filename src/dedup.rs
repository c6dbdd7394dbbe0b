//! Tracking of already-notified events
//!
//! The store is owned by whichever driver runs the pipeline and passed in
//! explicitly. Events without an identifier are never deduplicated.

use crate::error::Result;
use std::collections::HashSet;

/// A set of event identifiers that have already been sent
pub trait DedupStore: Send {
    /// True unless `event_id` has been marked sent. `None` is always new.
    fn is_new(&self, event_id: Option<&str>) -> bool;

    /// Record `event_id` as sent. Idempotent; `None` is ignored.
    fn mark_sent(&mut self, event_id: Option<&str>);

    /// Persist state after a pass. The in-memory store keeps nothing.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime store. Grows without eviction; the weekly feed is small
/// and the host restarts the process periodically.
#[derive(Debug, Default, Clone)]
pub struct MemoryDedupStore {
    sent: HashSet<String>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for MemoryDedupStore {
    fn is_new(&self, event_id: Option<&str>) -> bool {
        match event_id {
            Some(id) => !self.sent.contains(id),
            None => true,
        }
    }

    fn mark_sent(&mut self, event_id: Option<&str>) {
        if let Some(id) = event_id {
            if !self.sent.contains(id) {
                self.sent.insert(id.to_string());
            }
        }
    }

    fn len(&self) -> usize {
        self.sent.len()
    }
}
