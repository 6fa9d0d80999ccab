//! Asset record data model.
//!
//! An `AssetRecord` is the only entity of the simulator: one row of a class's
//! fixed price list. It contains the symbol, the current and previous price, the
//! derived change fields, a display volume, a static market cap and the UTC time
//! of the last mutation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketDataError;

/// Rounds `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Returns `value` unchanged when finite, `0.0` otherwise.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Traded volume shown as a magnitude with a unit suffix, e.g. `45.2M`.
///
/// Only the magnitude is ever changed; the unit character is kept verbatim and
/// never reinterpreted. On the wire it is the display string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Volume {
    value: f64,
    unit: char,
}

impl Volume {
    /// Creates a volume from a magnitude and unit suffix.
    pub fn new(value: f64, unit: char) -> Self {
        Self {
            value: round_to(value, 1),
            unit,
        }
    }

    /// Numeric magnitude, one decimal place.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit suffix character (`K`, `M`, `B`, ...).
    pub fn unit(&self) -> char {
        self.unit
    }

    /// Adds `amount` to the magnitude, keeping one decimal place.
    pub fn increment(&mut self, amount: f64) {
        self.value = round_to(self.value + amount, 1);
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.value, self.unit)
    }
}

impl FromStr for Volume {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unit = trimmed
            .chars()
            .last()
            .filter(|c| !c.is_ascii_digit() && *c != '.')
            .ok_or_else(|| MarketDataError::InvalidVolume(s.to_string()))?;
        let value = trimmed[..trimmed.len() - unit.len_utf8()]
            .parse::<f64>()
            .map_err(|_| MarketDataError::InvalidVolume(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(MarketDataError::InvalidVolume(s.to_string()));
        }
        Ok(Volume::new(value, unit))
    }
}

impl From<Volume> for String {
    fn from(volume: Volume) -> Self {
        volume.to_string()
    }
}

impl TryFrom<String> for Volume {
    type Error = MarketDataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Market record for a single symbol of one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Short uppercase ticker, unique within its class only.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Current price, two decimals.
    pub price: f64,
    /// Price immediately before the last mutation.
    pub previous_price: f64,
    /// `price - previous_price`, two decimals.
    pub change: f64,
    /// `change / previous_price * 100`, two decimals.
    pub change_percent: f64,
    /// Display volume; only the magnitude moves.
    pub volume: Volume,
    /// Static display string, never mutated.
    pub market_cap: String,
    /// Time of the most recent mutation.
    pub last_update: DateTime<Utc>,
}

impl AssetRecord {
    /// Creates a freshly seeded record: no change yet, previous price equals price.
    pub fn new(symbol: &str, name: &str, price: f64, volume: Volume, market_cap: &str) -> Self {
        AssetRecord {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            previous_price: price,
            change: 0.0,
            change_percent: 0.0,
            volume,
            market_cap: market_cap.to_string(),
            last_update: Utc::now(),
        }
    }

    /// Magnitude of the last move in percent, used for trending rankings.
    pub fn abs_change_percent(&self) -> f64 {
        self.change_percent.abs()
    }

    /// Case-insensitive match of `query` against symbol or name.
    ///
    /// `query` is expected to be lowercase already.
    pub fn matches(&self, query: &str) -> bool {
        self.symbol.to_lowercase().contains(query) || self.name.to_lowercase().contains(query)
    }
}
