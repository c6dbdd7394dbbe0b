//! Telegram message rendering
//!
//! Messages use Telegram's legacy `Markdown` parse mode. Every dynamic field
//! is escaped, and truncation only cuts at line boundaries so no bold entity
//! is ever left open.

use crate::config::FormatConfig;
use crate::types::NotificationRecord;
use chrono::{DateTime, Utc};

pub const NO_EVENTS: &str = "🟢 Nessun evento High Impact previsto per questa settimana.";
pub const ALL_NOTIFIED: &str =
    "🟢 Tutti gli eventi High Impact della settimana sono già stati notificati.";
pub const SUMMARY_BANNER: &str = "🗓 *Forex Factory – High Impact Events (settimana corrente)*";
pub const UPDATE_BANNER: &str = "🔔 *Forex Factory – Nuovi eventi High Impact*";
pub const CONTINUATION: &str = "\n\n… (continua con deploy successivo o manualmente)";

const MARKER: &str = "🔴";
const ERROR_DETAIL_CHARS: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct MessageFormatter {
    config: FormatConfig,
}

impl MessageFormatter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Render a list of events. The summary banner is used on the first run
    /// of a period, the update banner afterwards; an empty list always gives
    /// the sentinel.
    pub fn format(&self, records: &[NotificationRecord], is_initial_run: bool) -> String {
        self.render(records, is_initial_run).text
    }

    /// Like [`format`](Self::format), also reporting how many leading
    /// records made it into the text in full
    pub fn render(&self, records: &[NotificationRecord], is_initial_run: bool) -> Rendered {
        if records.is_empty() {
            return Rendered {
                text: NO_EVENTS.to_string(),
                shown: 0,
            };
        }

        let banner = if is_initial_run {
            SUMMARY_BANNER
        } else {
            UPDATE_BANNER
        };
        let (body, shown) = self.body(records);
        Rendered {
            text: format!("{}\n\n{}", banner, body),
            shown,
        }
    }

    /// Event blocks capped in count and characters, with the number of
    /// blocks kept whole
    pub fn body(&self, records: &[NotificationRecord]) -> (String, usize) {
        let blocks: Vec<String> = records
            .iter()
            .take(self.config.max_events)
            .map(render_block)
            .collect();
        let body = blocks.join("\n\n");

        let overflow = records.len() > self.config.max_events
            || body.chars().count() > self.config.max_chars;
        if !overflow {
            return (body, blocks.len());
        }

        let room = self
            .config
            .max_chars
            .saturating_sub(CONTINUATION.chars().count());
        let mut body = truncate_at_line(&body, room);

        let kept = body.chars().count();
        let mut end = 0;
        let shown = blocks
            .iter()
            .take_while(|block| {
                end += block.chars().count();
                let whole = end <= kept;
                end += 2;
                whole
            })
            .count();

        body.push_str(CONTINUATION);
        (body, shown)
    }
}

/// Rendered message text
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    /// Leading records fully present in `text`
    pub shown: usize,
}

fn render_block(record: &NotificationRecord) -> String {
    format!(
        "{} *{}*\n{}\n{}\nForecast: {}\nPrevious: {}",
        MARKER,
        record.when,
        escape_markdown(&record.country),
        escape_markdown(&record.title),
        escape_markdown(&record.forecast),
        escape_markdown(&record.previous),
    )
}

/// Longest prefix of at most `max_chars` characters ending at a line break.
/// A single over-long line is cut mid-line as a last resort.
fn truncate_at_line(text: &str, max_chars: usize) -> String {
    let end = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let prefix = &text[..end];

    let cut = match prefix.rfind('\n') {
        Some(idx) if end < text.len() => &prefix[..idx],
        _ => prefix,
    };
    cut.trim_end().to_string()
}

/// Escape legacy-Markdown control characters
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Shown instead of the event list when the feed could not be fetched
pub fn fetch_error_message(error: &str) -> String {
    let detail: String = error.chars().take(ERROR_DETAIL_CHARS).collect();
    format!(
        "❌ Errore nel recupero dati Forex Factory:\n{}",
        escape_markdown(&detail)
    )
}

/// Sent by the web-server driver once its startup pass is done
pub fn startup_message(now: DateTime<Utc>) -> String {
    format!(
        "✅ *Bot Forex Factory avviato*\n\
         Riceverai le notifiche High Impact al riavvio del servizio.\n\
         Ora: {}",
        now.format("%Y-%m-%d %H:%M UTC")
    )
}
