//! Scheduled-invocation driver
//!
//! Each invocation runs exactly one pass and answers with an HTTP-style
//! status. The first invocation served by a process sends the weekly summary;
//! later ones (a warm runtime reused by the scheduler) send only new events.

use crate::dedup::DedupStore;
use crate::pipeline::{Pipeline, RunReport};
use serde::Serialize;

/// Response returned to the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn from_report(report: &RunReport) -> Self {
        let (status_code, body) = if report.fetch_failed {
            (500, "Errore nel recupero del calendario".to_string())
        } else if report.message.is_none() {
            (200, "Nessun nuovo evento High Impact".to_string())
        } else if report.delivered {
            (200, format!("Notifica inviata ({} eventi)", report.selected))
        } else {
            (500, "Invio Telegram non riuscito".to_string())
        };
        Self { status_code, body }
    }
}

pub struct ScheduledHandler<S: DedupStore> {
    pipeline: Pipeline,
    store: S,
    invocations: u64,
}

impl<S: DedupStore> ScheduledHandler<S> {
    pub fn new(pipeline: Pipeline, store: S) -> Self {
        Self {
            pipeline,
            store,
            invocations: 0,
        }
    }

    pub async fn handle(&mut self) -> InvocationResponse {
        let is_initial_run = self.invocations == 0;
        self.invocations += 1;

        tracing::info!(
            "Scheduled invocation #{} ({})",
            self.invocations,
            if is_initial_run { "summary" } else { "update" }
        );
        let report = self.pipeline.run_once(&mut self.store, is_initial_run).await;
        let response = InvocationResponse::from_report(&report);
        tracing::info!("Invocation finished: {} {}", response.status_code, response.body);
        response
    }
}
