//! Telegram command bot
//!
//! Long-polls `getUpdates` and answers `/start`, `/sondaggio`, `/news`,
//! `/nuovi` and `/help`. Pipeline passes are only run for the configured chat,
//! given either as a numeric id or as an `@username`.


use crate::config::{BotConfig, Credentials, TelegramConfig};
use crate::dedup::DedupStore;
use crate::error::{BotError, Result};
use crate::formatter::escape_markdown;
use crate::notify::TelegramNotifier;
use crate::pipeline::Pipeline;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const GREETING: &str = "Ciao! Sono il tuo bot per i sondaggi Forex.";

const HELP: &str = "🤖 *Comandi disponibili*\n\n\
/start - Saluto\n\
/sondaggio - Link al sondaggio\n\
/news - Riepilogo settimanale degli eventi non ancora notificati\n\
/nuovi - Solo eventi non ancora notificati\n\
/help - Questo messaggio";

/// Commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Survey,
    /// Full weekly summary
    News,
    /// Only events not notified yet
    Fresh,
    Help,
    Unknown(String),
}

impl BotCommand {
    /// Parse `/cmd[@botname] [args]`; plain text is not a command
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let word = rest.split_whitespace().next().unwrap_or_default();
        let cmd = word.split('@').next().unwrap_or(word).to_lowercase();

        Some(match cmd.as_str() {
            "start" => BotCommand::Start,
            "sondaggio" => BotCommand::Survey,
            "news" => BotCommand::News,
            "nuovi" => BotCommand::Fresh,
            "help" => BotCommand::Help,
            _ => BotCommand::Unknown(cmd),
        })
    }

    /// Whether the command runs a pipeline pass
    pub fn runs_pipeline(&self) -> bool {
        matches!(self, BotCommand::News | BotCommand::Fresh)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
    username: Option<String>,
}

impl TelegramChat {
    /// Whether this chat is the configured one (`-100123` or `@name`)
    fn matches(&self, configured: &str) -> bool {
        let configured = configured.trim();
        match configured.strip_prefix('@') {
            Some(name) => self
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(name)),
            None => configured == self.id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
    description: Option<String>,
}

/// Long-polling command bot
pub struct CommandBot<S: DedupStore> {
    http: Client,
    api_base: String,
    credentials: Credentials,
    replies: TelegramNotifier,
    pipeline: Pipeline,
    store: S,
    survey_url: String,
    poll_timeout_secs: u64,
    next_offset: i64,
}

impl<S: DedupStore> CommandBot<S> {
    pub fn new(
        telegram: &TelegramConfig,
        bot: &BotConfig,
        credentials: Credentials,
        pipeline: Pipeline,
        store: S,
    ) -> Result<Self> {
        // The server holds the request open for up to poll_timeout_secs
        let http = Client::builder()
            .timeout(Duration::from_secs(bot.poll_timeout_secs + 10))
            .build()?;
        let replies = TelegramNotifier::new(telegram, Some(credentials.clone()))?;

        Ok(Self {
            http,
            api_base: telegram.api_base.trim_end_matches('/').to_string(),
            credentials,
            replies,
            pipeline,
            store,
            survey_url: bot.survey_url.clone(),
            poll_timeout_secs: bot.poll_timeout_secs,
            next_offset: 0,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Poll forever. Errors are logged and followed by a short pause.
    pub async fn start_polling(mut self) {
        tracing::info!("Starting Telegram command listener...");

        loop {
            if let Err(e) = self.poll_once().await {
                tracing::error!("Failed to poll Telegram updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    /// Fetch one batch of updates and handle them; returns how many arrived
    pub async fn poll_once(&mut self) -> Result<usize> {
        let url = format!("{}/bot{}/getUpdates", self.api_base, self.credentials.bot_token);
        let response: GetUpdatesResponse = self
            .http
            .get(&url)
            .query(&[
                ("offset", self.next_offset.to_string()),
                ("timeout", self.poll_timeout_secs.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(BotError::Api(
                response
                    .description
                    .unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }

        let count = response.result.len();
        for update in response.result {
            self.next_offset = self.next_offset.max(update.update_id + 1);
            self.handle_update(update).await;
        }
        Ok(count)
    }

    async fn handle_update(&mut self, update: TelegramUpdate) {
        let Some(msg) = update.message else {
            return;
        };
        let Some(command) = msg.text.as_deref().and_then(BotCommand::parse) else {
            return;
        };

        let chat_id = msg.chat.id.to_string();
        tracing::info!("Received command {:?} from chat {}", command, chat_id);

        if command.runs_pipeline() && !msg.chat.matches(&self.credentials.chat_id) {
            self.reply(&chat_id, "⛔ Comando non disponibile in questa chat.").await;
            return;
        }

        match command {
            BotCommand::Start => self.reply(&chat_id, GREETING).await,
            BotCommand::Survey => {
                let text = format!(
                    "Partecipa al sondaggio qui: {}",
                    escape_markdown(&self.survey_url)
                );
                self.reply(&chat_id, &text).await;
            }
            BotCommand::Help => self.reply(&chat_id, HELP).await,
            BotCommand::News => self.run_pass(&chat_id, true).await,
            BotCommand::Fresh => self.run_pass(&chat_id, false).await,
            BotCommand::Unknown(cmd) => {
                let text = format!(
                    "❓ Comando sconosciuto: /{}\nUsa /help per i comandi disponibili",
                    escape_markdown(&cmd)
                );
                self.reply(&chat_id, &text).await;
            }
        }
    }

    async fn run_pass(&mut self, chat_id: &str, is_initial_run: bool) {
        let report = self.pipeline.run_once(&mut self.store, is_initial_run).await;

        if report.message.is_none() {
            self.reply(chat_id, "🟢 Nessun nuovo evento High Impact.").await;
        } else if !report.delivered {
            self.reply(chat_id, "❌ Invio non riuscito, riprova più tardi.").await;
        }
    }

    async fn reply(&self, chat_id: &str, text: &str) {
        if !self.replies.send_to(chat_id, text).await {
            tracing::warn!("Reply to chat {} was not delivered", chat_id);
        }
    }
}
