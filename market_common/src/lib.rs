//!
//! Common types and utilities shared by the market data server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `MarketDataError` used across the workspace.
//! - `result` — handy `Result<T, MarketDataError>` alias.
//! - `asset_class` — asset class and feed selectors shared by both sides.
//! - `record` — the `AssetRecord` entity, its `Volume` field and rounding helpers.
//! - `seeds` — the hardcoded seed lists every service starts from.
//! - `config` — update cadence, volatility and polling settings.
#![warn(missing_docs)]
pub mod asset_class;
pub mod config;
pub mod error;
pub mod record;
pub mod result;
pub mod seeds;

pub use asset_class::{AssetClass, FeedKind};
pub use config::{ClassSchedule, FeedConfig};
pub use error::MarketDataError;
pub use record::{AssetRecord, Volume};
pub use result::Result;
