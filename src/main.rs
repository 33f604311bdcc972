//! DigitTrader - Main Entry Point
//!
//! Runs the trading engine against the paper venue and prints engine events.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use digit_trader::common::channels::{create_command_channel, create_engine_event_channel};
use digit_trader::config::load_config;
use digit_trader::{EngineCommand, EngineEvent, EngineRunner, PaperVenue, StrategyKind};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error), overrides settings.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Strategy to activate (switcher, rebound, matches, differs)
    #[arg(long)]
    strategy: Option<String>,

    /// Market to subscribe, e.g. R_100
    #[arg(long)]
    market: Option<String>,

    /// Do not start trading once enough ticks are buffered
    #[arg(long)]
    no_auto_start: bool,

    /// Print engine events as JSON lines on stdout
    #[arg(long)]
    json_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = load_config(Some(&args.config)).context("loading configuration")?;
    if let Some(strategy) = &args.strategy {
        config.strategy.active = strategy.parse::<StrategyKind>()?;
    }
    if let Some(market) = &args.market {
        config.trade.market = market.clone();
    }

    // Initialize logging, RUST_LOG wins over both flags
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    if args.json_logs {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Starting DigitTrader");
    info!(
        config = %args.config,
        strategy = %config.strategy.active,
        market = %config.trade.market,
        "configuration loaded"
    );

    let (event_tx, event_rx) = create_engine_event_channel();
    let (command_tx, command_rx) = create_command_channel();

    let venue = PaperVenue::new(config.paper.clone());
    let runner = EngineRunner::connect(venue, config, event_tx, command_rx)
        .await
        .context("connecting to venue")?
        .with_auto_start(!args.no_auto_start);

    let presenter = tokio::spawn(present_events(event_rx, args.json_events));
    let engine = tokio::spawn(runner.run());

    info!("Engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");

    if command_tx.send(EngineCommand::Shutdown).await.is_err() {
        warn!("engine already stopped");
    }
    let controller = engine.await?;
    drop(controller);
    presenter.await?;

    Ok(())
}

/// Presentation side: drain engine events until the engine goes away
async fn present_events(mut events: mpsc::UnboundedReceiver<EngineEvent>, json: bool) {
    while let Some(event) = events.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "cannot serialize engine event"),
            }
            continue;
        }

        match event {
            EngineEvent::StatsUpdate(stats) => info!(
                pnl = %stats.total_pnl,
                trades = stats.total_trades,
                win_rate = %stats.win_rate,
                stake = %stats.current_stake,
                step = stats.martingale_step,
                "stats"
            ),
            EngineEvent::TradeComplete(record) => info!(
                contract_id = %record.contract_id,
                contract_type = %record.contract_type,
                market = %record.market,
                won = record.won,
                profit = %record.profit,
                "trade complete"
            ),
            EngineEvent::TradingStop { reason } => warn!(reason = %reason, "trading stopped"),
            EngineEvent::Failure { action, reason } => {
                warn!(action = %action, reason = %reason, "action failed")
            }
            other => info!(event = ?other, "engine event"),
        }
    }
}
