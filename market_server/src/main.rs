//! Market data simulator, headless.
//!
//! This binary is the composition root of the simulator. It builds one
//! `MarketDataService`, subscribes a logger to every asset class, starts the
//! per-class update timers and, with `--bots`, the trading bot desk. Every tick
//! and every bot event is logged until Ctrl+C or `--duration-secs` elapses.
//!
//! Concurrency and shutdown:
//! - Subscriber callbacks forward snapshots into a crossbeam channel so the main
//!   thread does all the logging.
//! - Crossbeam `select!` multiplexes snapshots, bot events, the Ctrl+C signal and
//!   the optional deadline.
//! - On exit the bot runner and the scheduler are stopped and joined before the
//!   subscriptions are dropped.
#![warn(missing_docs)]
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{after, bounded, never, select, unbounded};
use log::{info, warn};
use market_common::{AssetClass, FeedConfig, MarketDataError, Result};
use market_server::{BotDesk, BotEvent, BotModel, BotRunner, MarketDataService, RandomDraw, Snapshot};

use crate::args::Args;

mod args;

fn load_config(args: &Args) -> Result<FeedConfig> {
    let mut config = match &args.config {
        Some(path) => FeedConfig::from_file(path)?,
        None => FeedConfig::default(),
    };
    let overrides = [
        (AssetClass::Stocks, args.stocks_ms),
        (AssetClass::Crypto, args.crypto_ms),
        (AssetClass::Indices, args.indices_ms),
    ];
    for (class, interval_ms) in overrides {
        if let Some(ms) = interval_ms {
            config.schedule_mut(class).interval_ms = ms;
        }
    }
    config.validate()?;
    Ok(config)
}

fn log_snapshot(class: AssetClass, snapshot: &Snapshot) {
    let top = snapshot
        .iter()
        .max_by(|a, b| a.abs_change_percent().total_cmp(&b.abs_change_percent()));
    match top {
        Some(record) => info!(
            "{}: {} records, top mover {} {:.2} ({:+.2}%)",
            class,
            snapshot.len(),
            record.symbol,
            record.price,
            record.change_percent
        ),
        None => info!("{}: empty", class),
    }
}

fn log_bot_event(event: &BotEvent) {
    match event {
        BotEvent::Created { name, .. } => info!("Bot created: {}", name),
        BotEvent::Started { name, .. } => info!("Bot started: {}", name),
        BotEvent::Paused { name, .. } => info!("Bot paused: {}", name),
        BotEvent::SettingsUpdated { name, .. } => info!("Bot settings updated: {}", name),
        BotEvent::Deleted { name, .. } => info!("Bot deleted: {}", name),
        BotEvent::Traded {
            id,
            successful,
            profit_loss,
            total_profit,
        } => info!(
            "Bot {} trade {}: {:+.2}, total {:.2}",
            id,
            if *successful { "won" } else { "lost" },
            profit_loss,
            total_profit
        ),
    }
}

fn main() -> Result<(), MarketDataError> {
    init_logger();
    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Feed config: {:?}", config);

    let draw = match args.seed {
        Some(seed) => RandomDraw::seeded(seed),
        None => RandomDraw::new(),
    };
    let service = MarketDataService::builder().config(config).draw(draw).build()?;

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| MarketDataError::Io(io::Error::other(e)))?;

    let (update_tx, update_rx) = unbounded::<(AssetClass, Snapshot)>();
    let mut subscriptions = Vec::new();
    for class in AssetClass::all() {
        let tx = update_tx.clone();
        subscriptions.push(service.subscribe(class, move |snapshot| {
            let _ = tx.send((class, snapshot));
        })?);
    }
    drop(update_tx);

    service.start_updates()?;

    let mut runner = None;
    let bot_rx = if args.bots {
        let desk = Arc::new(Mutex::new(BotDesk::with_demo_bots(BotModel::default())));
        let events = desk.lock()?.events();
        runner = Some(BotRunner::start(desk)?);
        events
    } else {
        never()
    };

    let deadline = match args.duration_secs {
        Some(secs) => after(Duration::from_secs(secs)),
        None => never(),
    };

    info!("Simulator is running. Press Ctrl+C to exit.");
    loop {
        select! {
            recv(update_rx) -> msg => match msg {
                Ok((class, snapshot)) => log_snapshot(class, &snapshot),
                Err(_) => {
                    warn!("Update channel closed");
                    break;
                }
            },
            recv(bot_rx) -> msg => if let Ok(event) = msg {
                log_bot_event(&event);
            },
            recv(shutdown_rx) -> _ => {
                info!("Ctrl+C received. Shutting down simulator...");
                break;
            },
            recv(deadline) -> _ => {
                info!("Run duration elapsed. Shutting down simulator...");
                break;
            },
        }
    }

    if let Some(runner) = runner.as_mut() {
        runner.stop();
    }
    service.stop_updates()?;
    drop(subscriptions);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
