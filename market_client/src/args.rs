use std::path::PathBuf;

use clap::Parser;
use market_common::FeedKind;
use market_server::model::query::DEFAULT_SEARCH_LIMIT;

/// Terminal watcher for the simulated market data feed.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Args {
    /// Feeds to watch; repeat the flag for several.
    #[arg(long = "kind", value_enum, default_values_t = vec![FeedKind::Stocks])]
    pub kinds: Vec<FeedKind>,

    /// Print the markets matching this query once and exit.
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum number of search results.
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,

    /// Print states as JSON instead of tables.
    #[arg(long)]
    pub json: bool,

    /// JSON feed configuration; omitted fields keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}
