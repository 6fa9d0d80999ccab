//! Asset class and feed selectors shared between server and client.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::MarketDataError;

/// A partition of the record store with its own update cadence and volatility.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[clap(rename_all = "lower")]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum AssetClass {
    /// Equities.
    #[strum(to_string = "stocks", serialize = "equities")]
    Stocks,
    /// Crypto assets, the fastest and most volatile feed.
    #[strum(to_string = "crypto")]
    Crypto,
    /// Market indices, the slowest and calmest feed.
    #[strum(to_string = "indices")]
    Indices,
}

impl AssetClass {
    /// Parses a class name, rejecting anything that is not a known class.
    ///
    /// `trending` is a feed, not a class, and is rejected here as well.
    pub fn parse(name: &str) -> Result<Self, MarketDataError> {
        name.trim()
            .parse::<Self>()
            .map_err(|_| MarketDataError::UnknownAssetClass(name.to_string()))
    }

    /// All classes in their canonical order: stocks, crypto, indices.
    pub fn all() -> impl Iterator<Item = AssetClass> {
        Self::iter()
    }
}

/// Selector used by consumers: one of the asset classes or the trending view.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FeedKind {
    /// Push feed of the equities class.
    #[strum(to_string = "stocks", serialize = "equities")]
    Stocks,
    /// Push feed of the crypto class.
    #[strum(to_string = "crypto")]
    Crypto,
    /// Push feed of the indices class.
    #[strum(to_string = "indices")]
    Indices,
    /// Cross-class ranking, polled because it has no push channel.
    #[strum(to_string = "trending")]
    Trending,
}

impl FeedKind {
    /// Parses a feed name, rejecting unknown names.
    pub fn parse(name: &str) -> Result<Self, MarketDataError> {
        name.trim()
            .parse::<Self>()
            .map_err(|_| MarketDataError::UnknownAssetClass(name.to_string()))
    }

    /// The asset class backing this feed, `None` for `Trending`.
    pub fn asset_class(self) -> Option<AssetClass> {
        match self {
            FeedKind::Stocks => Some(AssetClass::Stocks),
            FeedKind::Crypto => Some(AssetClass::Crypto),
            FeedKind::Indices => Some(AssetClass::Indices),
            FeedKind::Trending => None,
        }
    }
}

impl From<AssetClass> for FeedKind {
    fn from(class: AssetClass) -> Self {
        match class {
            AssetClass::Stocks => FeedKind::Stocks,
            AssetClass::Crypto => FeedKind::Crypto,
            AssetClass::Indices => FeedKind::Indices,
        }
    }
}
