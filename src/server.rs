//! Web server driver
//!
//! Runs one summary pass at startup, then serves a status page on `/` and a
//! manual trigger on `/send`. Passes share one dedup store behind a mutex, so
//! concurrent `/send` requests run one after another. The status page never
//! takes that mutex; it reads a counter refreshed after each pass.

use crate::config::ServerConfig;
use crate::dedup::DedupStore;
use crate::error::Result;
use crate::formatter::startup_message;
use crate::pipeline::{Pipeline, RunReport};
use axum::{extract::State, response::Html, routing::get, Router};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// State shared across handlers
pub struct AppState {
    pub pipeline: Pipeline,
    pub store: Mutex<Box<dyn DedupStore>>,
    pub started_at: DateTime<Utc>,
    /// Size of the store as of the last finished pass
    notified: AtomicUsize,
}

impl AppState {
    pub fn new(pipeline: Pipeline, store: Box<dyn DedupStore>) -> Self {
        let notified = AtomicUsize::new(store.len());
        Self {
            pipeline,
            store: Mutex::new(store),
            started_at: Utc::now(),
            notified,
        }
    }

    pub fn notified(&self) -> usize {
        self.notified.load(Ordering::Relaxed)
    }

    /// One pass with exclusive access to the store
    pub async fn run_pass(&self, is_initial_run: bool) -> RunReport {
        let mut store = self.store.lock().await;
        let report = self.pipeline.run_once(&mut **store, is_initial_run).await;
        self.notified.store(store.len(), Ordering::Relaxed);
        report
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/send", get(manual_send))
        .with_state(state)
}

/// Startup pass plus the optional "bot started" notice
pub async fn startup(state: &AppState, notice: bool) -> RunReport {
    tracing::info!("Running startup pass");
    let report = state.run_pass(true).await;

    if notice && !state.pipeline.sink().send(&startup_message(Utc::now())).await {
        tracing::warn!("Startup notice was not delivered");
    }
    report
}

pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down web server");
        })
        .await?;
    Ok(())
}

async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    let sent = state.notified();
    Html(format!(
        "<h1>Forex Factory High Impact Telegram Notifier</h1>\n\
         <p>Il bot è attivo dal {}.<br>\n\
         Le notifiche High Impact vengono inviate al tuo Telegram al momento del deploy / riavvio.</p>\n\
         <p>Eventi già notificati: {}</p>\n\
         <p><a href=\"/send\">Prova invio manuale</a></p>\n",
        state.started_at.format("%Y-%m-%d %H:%M UTC"),
        sent
    ))
}

async fn manual_send(State(state): State<Arc<AppState>>) -> Html<String> {
    let report = state.run_pass(true).await;
    let status = if report.is_success() { "OK ✅" } else { "ERRORE ❌" };
    let message = report.message.as_deref().unwrap_or_default();

    Html(format!(
        "<h2>Invio manuale: {}</h2><pre>{}</pre>",
        status,
        escape_html(message)
    ))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
