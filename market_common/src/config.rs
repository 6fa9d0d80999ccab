//! Update cadence, volatility and polling settings shared by server and client.
//!
//! Defaults reproduce the dashboard feed: stocks every 3 s at ±20%, crypto every
//! second at ±50%, indices every 5 s at ±10%, trending polled every 2 s.
//! A `FeedConfig` may also be loaded from a JSON file; missing fields fall back
//! to the defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset_class::AssetClass;
use crate::error::MarketDataError;

/// Stocks tick interval in milliseconds.
pub const STOCKS_INTERVAL_MS: u64 = 3000;
/// Crypto tick interval in milliseconds.
pub const CRYPTO_INTERVAL_MS: u64 = 1000;
/// Indices tick interval in milliseconds.
pub const INDICES_INTERVAL_MS: u64 = 5000;
/// Default volatility factor, used for stocks.
pub const DEFAULT_VOLATILITY: f64 = 0.2;
/// Crypto volatility factor.
pub const CRYPTO_VOLATILITY: f64 = 0.5;
/// Indices volatility factor.
pub const INDICES_VOLATILITY: f64 = 0.1;
/// Trending feed polling interval in milliseconds.
pub const TRENDING_POLL_MS: u64 = 2000;

/// Cadence and volatility of one asset class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassSchedule {
    /// Time between two ticks, in milliseconds.
    pub interval_ms: u64,
    /// Symmetric bound on the fractional price change of one tick.
    pub volatility: f64,
}

impl ClassSchedule {
    /// Tick interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Settings of the whole simulated feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Equities schedule.
    pub stocks: ClassSchedule,
    /// Crypto schedule.
    pub crypto: ClassSchedule,
    /// Indices schedule.
    pub indices: ClassSchedule,
    /// How often consumers re-read the trending view.
    pub trending_poll_ms: u64,
    /// Lower bound applied to every new price. `None` lets prices drift freely.
    pub price_floor: Option<f64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            stocks: ClassSchedule {
                interval_ms: STOCKS_INTERVAL_MS,
                volatility: DEFAULT_VOLATILITY,
            },
            crypto: ClassSchedule {
                interval_ms: CRYPTO_INTERVAL_MS,
                volatility: CRYPTO_VOLATILITY,
            },
            indices: ClassSchedule {
                interval_ms: INDICES_INTERVAL_MS,
                volatility: INDICES_VOLATILITY,
            },
            trending_poll_ms: TRENDING_POLL_MS,
            price_floor: None,
        }
    }
}

impl FeedConfig {
    /// Reads and validates a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MarketDataError> {
        let reader = BufReader::new(File::open(path)?);
        let config: FeedConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Schedule of `class`.
    pub fn schedule(&self, class: AssetClass) -> ClassSchedule {
        match class {
            AssetClass::Stocks => self.stocks,
            AssetClass::Crypto => self.crypto,
            AssetClass::Indices => self.indices,
        }
    }

    /// Mutable schedule of `class`, for CLI overrides.
    pub fn schedule_mut(&mut self, class: AssetClass) -> &mut ClassSchedule {
        match class {
            AssetClass::Stocks => &mut self.stocks,
            AssetClass::Crypto => &mut self.crypto,
            AssetClass::Indices => &mut self.indices,
        }
    }

    /// Trending polling interval as a `Duration`.
    pub fn trending_poll(&self) -> Duration {
        Duration::from_millis(self.trending_poll_ms)
    }

    /// Checks intervals are positive and volatilities lie in `[0, 1)`.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        for class in AssetClass::all() {
            let schedule = self.schedule(class);
            if schedule.interval_ms == 0 {
                return Err(MarketDataError::InvalidConfig(format!(
                    "{class} interval must be positive"
                )));
            }
            if !(0.0..1.0).contains(&schedule.volatility) {
                return Err(MarketDataError::InvalidConfig(format!(
                    "{class} volatility {} outside [0, 1)",
                    schedule.volatility
                )));
            }
        }
        if self.trending_poll_ms == 0 {
            return Err(MarketDataError::InvalidConfig(
                "trending poll interval must be positive".to_string(),
            ));
        }
        if let Some(floor) = self.price_floor {
            if !floor.is_finite() || floor < 0.0 {
                return Err(MarketDataError::InvalidConfig(format!(
                    "price floor {floor} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}
