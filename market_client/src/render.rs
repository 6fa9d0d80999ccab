//! Plain-text rendering of feed states and search results.

use market_common::{AssetRecord, FeedKind};
use market_server::SearchHit;

use crate::feed::FeedState;

/// Table header matching [`format_row`].
pub fn header() -> String {
    format!(
        "{:<6} {:<16} {:>12} {:>10} {:>8} {:>8} {:>8}",
        "SYMBOL", "NAME", "PRICE", "CHANGE", "CHG%", "VOLUME", "MCAP"
    )
}

/// One aligned row for a record. Non-finite numbers are shown as `-`.
pub fn format_row(record: &AssetRecord) -> String {
    let number = |value: f64, signed: bool| {
        if !value.is_finite() {
            "-".to_string()
        } else if signed {
            format!("{value:+.2}")
        } else {
            format!("{value:.2}")
        }
    };
    let name: String = record.name.chars().take(16).collect();
    format!(
        "{:<6} {:<16} {:>12} {:>10} {:>8} {:>8} {:>8}",
        record.symbol,
        name,
        number(record.price, false),
        number(record.change, true),
        number(record.change_percent, true),
        record.volume.to_string(),
        record.market_cap
    )
}

/// Title line plus table of a feed state.
pub fn format_feed(kind: FeedKind, state: &FeedState) -> String {
    if state.is_loading {
        return format!("== {kind} ==\nloading...");
    }
    let mut lines = vec![format!("== {kind} ({} records) ==", state.data.len()), header()];
    lines.extend(state.data.iter().map(format_row));
    lines.join("\n")
}

/// Search results, one row per hit prefixed by its class.
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No markets matching {query:?}");
    }
    let mut lines = vec![format!("Found {} markets matching {query:?}", hits.len())];
    lines.extend(
        hits.iter()
            .map(|hit| format!("{:<8} {}", hit.class.to_string(), format_row(&hit.record))),
    );
    lines.join("\n")
}
