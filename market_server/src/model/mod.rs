//! Domain models and utilities for the market data server.
//!
//! This module groups the building blocks used by the service and the
//! scheduler:
//! - `pricing` — the per-tick price mutation routine and its random sources.
//! - `registry` — per-class subscriber sets and snapshot fan-out.
//! - `query` — trending ranking, symbol lookup and search.
//! - `bot_desk` — the simulated trading bot roster and its events.

pub mod bot_desk;
pub mod pricing;
pub mod query;
pub mod registry;
