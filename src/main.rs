//! Forex Factory High Impact Notifier
//!
//! Three ways to run the same pipeline: a web server, a Telegram command bot
//! and a one-shot scheduled invocation.

use clap::{Parser, Subcommand};
use forex_news_bot::{
    config::Config,
    dedup::MemoryDedupStore,
    feed::FeedClient,
    formatter::MessageFormatter,
    notify::TelegramNotifier,
    pipeline::Pipeline,
    scheduled::ScheduledHandler,
    server::{self, AppState},
    telegram::CommandBot,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "forex-news-bot")]
#[command(about = "Relays Forex Factory high-impact events to Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (optional; environment variables also apply)
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Send the weekly summary, then serve the status page and manual trigger
    Serve,
    /// Answer Telegram commands via long polling
    Poll,
    /// Run one scheduled pass and print the JSON response
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Poll => run_bot(config).await,
        Commands::Once => run_scheduled(config).await,
    }
}

fn build_pipeline(config: &Config, notifier: TelegramNotifier) -> anyhow::Result<Pipeline> {
    let source = FeedClient::new(config.feed.clone())?;
    Ok(Pipeline::new(
        Box::new(source),
        Box::new(notifier),
        MessageFormatter::new(config.format.clone()),
    ))
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting Forex Factory High Impact Notifier");

    // The web server stays up without credentials; sends just fail
    let notifier = match config.credentials() {
        Ok(creds) => TelegramNotifier::new(&config.telegram, Some(creds))?,
        Err(e) => {
            tracing::warn!("{}; Telegram notifications disabled", e);
            TelegramNotifier::disabled()
        }
    };

    let pipeline = build_pipeline(&config, notifier)?;
    let state = Arc::new(AppState::new(pipeline, Box::new(MemoryDedupStore::new())));

    server::startup(&state, config.server.startup_notice).await;
    server::serve(&config.server, state).await?;
    Ok(())
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    let creds = config.credentials()?;
    let notifier = TelegramNotifier::new(&config.telegram, Some(creds.clone()))?;
    let pipeline = build_pipeline(&config, notifier)?;

    let bot = CommandBot::new(
        &config.telegram,
        &config.bot,
        creds,
        pipeline,
        MemoryDedupStore::new(),
    )?;

    tokio::select! {
        _ = bot.start_polling() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down command bot");
        }
    }
    Ok(())
}

async fn run_scheduled(config: Config) -> anyhow::Result<()> {
    let creds = config.credentials()?;
    let notifier = TelegramNotifier::new(&config.telegram, Some(creds))?;
    let pipeline = build_pipeline(&config, notifier)?;

    let mut handler = ScheduledHandler::new(pipeline, MemoryDedupStore::new());
    let response = handler.handle().await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
