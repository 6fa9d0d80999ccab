//! Seed lists every market data service starts from.
//!
//! Each class is a fixed ordered list; the service never adds or removes
//! records after construction.

use crate::asset_class::AssetClass;
use crate::record::{AssetRecord, Volume};

/// One seed row: symbol, name, price, volume magnitude, volume unit, market cap.
type SeedRow = (&'static str, &'static str, f64, f64, char, &'static str);

const STOCKS: [SeedRow; 8] = [
    ("AAPL", "Apple Inc", 182.63, 45.2, 'M', "2.87T"),
    ("MSFT", "Microsoft Corp", 337.22, 23.1, 'M', "2.51T"),
    ("GOOGL", "Alphabet Inc", 142.56, 18.7, 'M', "1.82T"),
    ("AMZN", "Amazon.com Inc", 178.22, 32.5, 'M', "1.85T"),
    ("NVDA", "NVIDIA Corp", 824.18, 51.3, 'M', "2.03T"),
    ("META", "Meta Platforms", 472.22, 15.8, 'M', "1.21T"),
    ("TSLA", "Tesla Inc", 198.45, 28.4, 'M', "631.2B"),
    ("JPM", "JPMorgan Chase", 183.27, 8.3, 'M', "528.5B"),
];

const CRYPTO: [SeedRow; 8] = [
    ("BTC", "Bitcoin", 35420.5, 24.5, 'B', "692.8B"),
    ("ETH", "Ethereum", 1850.75, 12.3, 'B', "222.4B"),
    ("BNB", "Binance Coin", 342.18, 1.2, 'B', "52.8B"),
    ("SOL", "Solana", 124.56, 3.5, 'B', "53.2B"),
    ("ADA", "Cardano", 0.45, 428.3, 'M', "15.9B"),
    ("XRP", "XRP", 0.52, 1.8, 'B', "28.3B"),
    ("DOGE", "Dogecoin", 0.12, 2.1, 'B', "16.2B"),
    ("DOT", "Polkadot", 6.78, 342.5, 'M', "8.5B"),
];

const INDICES: [SeedRow; 8] = [
    ("SPX", "S&P 500", 5021.84, 2.1, 'B', "N/A"),
    ("DJI", "Dow Jones", 38996.35, 345.2, 'M', "N/A"),
    ("IXIC", "NASDAQ", 15982.08, 4.8, 'B', "N/A"),
    ("RUT", "Russell 2000", 2018.56, 856.3, 'M', "N/A"),
    ("FTSE", "FTSE 100", 7682.75, 623.5, 'M', "N/A"),
    ("DAX", "DAX", 17842.35, 78.2, 'M', "N/A"),
    ("N225", "Nikkei 225", 38262.16, 1.2, 'B', "N/A"),
    ("HSI", "Hang Seng", 16589.42, 1.8, 'B', "N/A"),
];

/// Builds the seed list for `class`, stamped with the current time.
pub fn seed_records(class: AssetClass) -> Vec<AssetRecord> {
    let rows: &[SeedRow] = match class {
        AssetClass::Stocks => &STOCKS,
        AssetClass::Crypto => &CRYPTO,
        AssetClass::Indices => &INDICES,
    };
    rows.iter()
        .map(|&(symbol, name, price, volume, unit, market_cap)| {
            AssetRecord::new(symbol, name, price, Volume::new(volume, unit), market_cap)
        })
        .collect()
}
