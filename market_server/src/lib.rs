//! Simulated market data engine.
//!
//! The crate keeps three independently ticking price feeds (stocks, crypto,
//! indices) in memory and fans every update out to subscribers. Its building
//! blocks:
//!
//! - `MarketDataService` — owns the record lists, runs ticks and answers
//!   snapshot queries. Cheap to clone; every clone talks to the same state.
//! - `Scheduler` — one background thread multiplexing a crossbeam timer per
//!   class with a stop channel, so each class keeps its own cadence and ticks
//!   never overlap.
//! - `SubscriberRegistry` — per-class callbacks receiving immutable snapshots.
//! - `BotDesk` / `BotRunner` — a pseudo-random trading bot roster publishing
//!   structured events.
//!
//! ```no_run
//! use market_common::AssetClass;
//! use market_server::MarketDataService;
//!
//! fn main() -> market_common::Result<()> {
//!     let service = MarketDataService::new();
//!     service.start_updates()?;
//!     let _sub = service.subscribe(AssetClass::Crypto, |records| {
//!         println!("{} crypto records", records.len());
//!     })?;
//!     std::thread::sleep(std::time::Duration::from_secs(3));
//!     service.stop_updates()
//! }
//! ```
#![warn(missing_docs)]

pub mod bot_runner;
pub mod model;
pub mod scheduler;
pub mod service;

pub use bot_runner::BotRunner;
pub use model::bot_desk::{BotDesk, BotEvent, BotModel};
pub use model::pricing::{FixedDraw, PriceDraw, RandomDraw};
pub use model::query::SearchHit;
pub use model::registry::{Snapshot, SubscriberRegistry, Subscription};
pub use scheduler::{PeriodicTask, Scheduler};
pub use service::{MarketDataService, MarketDataServiceBuilder};
