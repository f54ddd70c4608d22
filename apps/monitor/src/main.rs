//! Spread Monitor
//!
//! Polls USDT perpetual prices on several futures exchanges and sends a
//! Telegram alert when the same contract trades at a wide spread between two
//! of them.

mod clock;
mod config;
mod monitor;

use clap::{Parser, Subcommand};
use clock::SystemClock;
use config::{AppConfig, ConfigError};
use monitor::{MonitorSettings, SpreadMonitor};
use spread_alerts::{
    BlacklistStore, CommandPoller, Notifier, NotifierConfig, TelegramApi, TelegramError,
};
use spread_core::Exchange;
use spread_engine::{CooldownTracker, SpreadDetector};
use spread_feeds::{FeedError, FeedSet, RestClient};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Spread Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "spread-monitor")]
#[command(about = "Futures cross-exchange spread monitor with Telegram alerts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Poll, detect and alert until interrupted (default)
    Run,
    /// Run a single cycle and exit
    Once,
    /// Print how many MEXC symbols each other exchange also lists
    Overlap,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Telegram(#[from] TelegramError),
    #[error("Failed to install logger: {0}")]
    Logging(String),
}

fn init_logging(level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Logging(e.to_string()))
}

fn build_monitor(config: &AppConfig) -> Result<SpreadMonitor, AppError> {
    let exchanges = config.unique_exchanges();
    let client = RestClient::new(config.monitoring.request_timeout())?;
    let feeds = FeedSet::from_exchanges(&exchanges, client);

    // getUpdates long-polls, so the HTTP timeout must outlast it
    let telegram_timeout = config.monitoring.request_timeout()
        + Duration::from_secs(u64::from(CommandPoller::POLL_TIMEOUT_SECS));
    let api = Arc::new(TelegramApi::new(&config.telegram.bot_token, telegram_timeout)?);

    let notifier = Notifier::new(
        api.clone(),
        NotifierConfig::new(config.telegram.chat_id.clone()).with_topic(config.telegram.topic_id),
    );
    let commands = CommandPoller::new(
        api,
        config.telegram.chat_id.clone(),
        config.telegram.bot_username.clone(),
    );

    let mut blacklist = BlacklistStore::load(config.blacklist.path.clone());
    let seeded = blacklist.seed(config.blacklist.initial.iter().cloned());
    info!(
        path = %blacklist.path().display(),
        symbols = blacklist.len(),
        seeded,
        "Blacklist ready"
    );

    Ok(SpreadMonitor::new(
        feeds,
        SpreadDetector::new(config.spread.clone()),
        CooldownTracker::new(config.cooldown.window()),
        blacklist,
        notifier,
        commands,
        Arc::new(SystemClock),
        MonitorSettings {
            symbols: config.symbols.clone(),
            scan_interval: config.monitoring.scan_interval(),
            stats_every_cycles: config.monitoring.stats_every_cycles,
        },
    ))
}

async fn print_overlap(config: &AppConfig) -> Result<(), AppError> {
    let client = RestClient::new(config.monitoring.request_timeout())?;
    let mut exchanges = config.unique_exchanges();
    if !exchanges.contains(&Exchange::Mexc) {
        exchanges.insert(0, Exchange::Mexc);
    }
    let feeds = FeedSet::from_exchanges(&exchanges, client);

    let report = feeds.symbol_overlap(Exchange::Mexc).await?;
    println!("{}: {} symbols", report.reference, report.reference_count);
    for (exchange, listed, shared) in &report.overlaps {
        println!("  {:<8} {:>5} listed, {:>5} shared", exchange.as_str(), listed, shared);
    }
    for (exchange, reason) in &report.failed {
        println!("  {:<8} failed: {}", exchange.as_str(), reason);
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = AppConfig::load(&args.config)?;
    info!(config = %args.config.display(), "Configuration loaded");

    let mode = args.mode.unwrap_or(Mode::Run);
    if mode == Mode::Overlap {
        return print_overlap(&config).await;
    }

    config.require_telegram()?;
    let mut monitor = build_monitor(&config)?;

    match mode {
        Mode::Once => {
            let report = monitor.run_cycle().await;
            monitor.poll_commands().await;
            info!(
                symbols = report.symbols_scanned,
                opportunities = report.opportunities,
                sent = report.alerts_sent,
                "Single cycle finished"
            );
        }
        _ => {
            tokio::select! {
                _ = monitor.run() => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Shutting down...");
                }
            }
            let stats = monitor.stats();
            info!(
                cycles = stats.cycles,
                sent = stats.alerts_sent,
                cooldowns = monitor.cooldown().len(),
                blacklisted = monitor.blacklist().len(),
                "Spread monitor stopped"
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
