//! Market Client — a terminal watcher for the simulated market data feed.
//!
//! It builds a market data service in-process, mounts one `MarketDataFeed` per
//! requested kind and redraws a feed every time it signals a change, until
//! Ctrl+C. With `--search` it prints the matching markets once and exits.
//!
//! Usage example (CLI):
//! ```bash
//! market_client --kind crypto --kind trending
//! market_client --search coin --json
//! ```
#![warn(missing_docs)]
mod args;

use std::io;

use clap::Parser;
use crossbeam_channel::{bounded, select, unbounded};
use log::{error, info};
use market_client::render::{format_feed, format_hits};
use market_client::{FeedState, MarketDataFeed};
use market_common::{FeedConfig, FeedKind, MarketDataError, Result};
use market_server::MarketDataService;
use serde::Serialize;

use crate::args::Args;

#[derive(Serialize)]
struct JsonFrame<'a> {
    kind: FeedKind,
    #[serde(flatten)]
    state: &'a FeedState,
}

fn print_feed(kind: FeedKind, state: &FeedState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&JsonFrame { kind, state })?);
    } else {
        println!("{}\n", format_feed(kind, state));
    }
    Ok(())
}

fn main() -> Result<(), MarketDataError> {
    init_logger();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FeedConfig::from_file(path)?,
        None => FeedConfig::default(),
    };
    let service = MarketDataService::builder().config(config).build()?;

    if let Some(query) = &args.search {
        let hits = service.search(query, args.limit)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        } else {
            println!("{}", format_hits(query, &hits));
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| MarketDataError::Io(io::Error::other(e)))?;

    service.start_updates()?;

    let (render_tx, render_rx) = unbounded::<FeedKind>();
    let mut feeds = Vec::new();
    for kind in &args.kinds {
        if feeds.iter().any(|f: &MarketDataFeed| f.kind() == *kind) {
            continue;
        }
        let feed = MarketDataFeed::mount_with_render(&service, *kind, render_tx.clone())?;
        info!("Watching {}", kind);
        feeds.push(feed);
    }
    drop(render_tx);

    info!("Client is running. Press Ctrl+C to exit.");
    loop {
        select! {
            recv(render_rx) -> msg => match msg {
                Ok(kind) => {
                    if let Some(feed) = feeds.iter().find(|f| f.kind() == kind) {
                        if let Err(e) = print_feed(kind, &feed.state(), args.json) {
                            error!("Failed to print {}: {}", kind, e);
                        }
                    }
                }
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => {
                info!("Ctrl+C received. Shutting down client...");
                break;
            },
        }
    }

    for feed in feeds.iter_mut() {
        feed.unmount();
    }
    service.stop_updates()?;
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
