//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `MarketDataError`, so functions can simply return `Result<T>`.
use crate::error::MarketDataError;

/// Workspace-wide `Result` alias with `MarketDataError` as the default error.
pub type Result<T, E = MarketDataError> = std::result::Result<T, E>;
