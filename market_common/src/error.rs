//! Error types shared between the market data server and client.
//!
//! The `MarketDataError` enum unifies the few failure cases the simulator has:
//! unknown selectors coming in as strings, lookups that miss, invalid
//! configuration, and the I/O and JSON errors of loading that configuration.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::asset_class::AssetClass;

/// Unified error type shared by server and client.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// I/O error originating from the standard library (config files, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A string selector did not name any known asset class or feed.
    #[error("Unknown asset class: {0:?} (expected stocks, crypto, indices or trending)")]
    UnknownAssetClass(String),

    /// No record with the requested symbol exists in the given class.
    #[error("Symbol {symbol} not found in {class}")]
    SymbolNotFound {
        /// Class that was searched.
        class: AssetClass,
        /// Symbol as requested by the caller.
        symbol: String,
    },

    /// No trading bot with the given id exists on the desk.
    #[error("Trading bot not found: {0}")]
    BotNotFound(String),

    /// A volume display string could not be split into magnitude and unit.
    #[error("Invalid volume string: {0:?}")]
    InvalidVolume(String),

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<PoisonError<T>> for MarketDataError {
    fn from(err: PoisonError<T>) -> Self {
        MarketDataError::LockPoisoned(err.to_string())
    }
}
