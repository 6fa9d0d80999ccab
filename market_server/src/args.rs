use std::path::PathBuf;

use clap::Parser;

/// Headless market data simulator.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Args {
    /// JSON feed configuration; omitted fields keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stocks tick interval in milliseconds.
    #[arg(long)]
    pub stocks_ms: Option<u64>,

    /// Crypto tick interval in milliseconds.
    #[arg(long)]
    pub crypto_ms: Option<u64>,

    /// Indices tick interval in milliseconds.
    #[arg(long)]
    pub indices_ms: Option<u64>,

    /// Seed for reproducible price paths.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also run the simulated trading bot desk.
    #[arg(long)]
    pub bots: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C.
    #[arg(long)]
    pub duration_secs: Option<u64>,
}
