//! Consumer side of the simulated market data feed.
//!
//! - `feed` — `MarketDataFeed`, the mount/unmount adapter from service pushes
//!   (or trending polls) to a readable `{ data, is_loading }` state.
//! - `render` — plain-text tables for feeds and search results.
#![warn(missing_docs)]
pub mod feed;
pub mod render;

pub use feed::{FeedState, MarketDataFeed};
