//! Read-only views computed from class snapshots: the trending ranking, symbol
//! lookup and cross-class search.

use market_common::{AssetClass, AssetRecord, MarketDataError, Result};
use serde::Serialize;

/// How many stocks enter the trending view.
pub const TRENDING_STOCKS: usize = 3;
/// How many crypto assets enter the trending view.
pub const TRENDING_CRYPTO: usize = 3;
/// How many indices enter the trending view.
pub const TRENDING_INDICES: usize = 2;
/// Result cap used by the dashboard search box.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Sorts by descending absolute change percent. Stable: ties keep input order.
fn sort_by_move(records: &mut [AssetRecord]) {
    records.sort_by(|a, b| b.abs_change_percent().total_cmp(&a.abs_change_percent()));
}

fn top_movers(records: &[AssetRecord], count: usize) -> Vec<AssetRecord> {
    let mut ranked = records.to_vec();
    sort_by_move(&mut ranked);
    ranked.truncate(count);
    ranked
}

/// Biggest movers across classes: top 3 stocks, top 3 crypto and top 2 indices,
/// merged and re-ranked by descending absolute change percent.
pub fn trending(
    stocks: &[AssetRecord],
    crypto: &[AssetRecord],
    indices: &[AssetRecord],
) -> Vec<AssetRecord> {
    let mut merged = top_movers(stocks, TRENDING_STOCKS);
    merged.extend(top_movers(crypto, TRENDING_CRYPTO));
    merged.extend(top_movers(indices, TRENDING_INDICES));
    sort_by_move(&mut merged);
    merged
}

/// Case-insensitive symbol lookup within one class.
pub fn find_symbol(class: AssetClass, records: &[AssetRecord], symbol: &str) -> Result<AssetRecord> {
    records
        .iter()
        .find(|r| r.symbol.eq_ignore_ascii_case(symbol.trim()))
        .cloned()
        .ok_or_else(|| MarketDataError::SymbolNotFound {
            class,
            symbol: symbol.to_string(),
        })
}

/// One search result, tagged with its class since symbols repeat across classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Class the record belongs to.
    pub class: AssetClass,
    /// Copy of the matching record.
    pub record: AssetRecord,
}

/// Case-insensitive substring search on symbol or name.
///
/// `classes` is searched in the given order and at most `limit` hits are
/// returned. A blank query matches nothing.
pub fn search<'a, I>(classes: I, query: &str, limit: usize) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (AssetClass, &'a [AssetRecord])>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let needle = needle.as_str();
    classes
        .into_iter()
        .flat_map(move |(class, records)| {
            records
                .iter()
                .filter(move |r| r.matches(needle))
                .map(move |r| SearchHit {
                    class,
                    record: r.clone(),
                })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_common::seeds::seed_records;

    fn with_moves(class: AssetClass, moves: &[f64]) -> Vec<AssetRecord> {
        seed_records(class)
            .into_iter()
            .zip(moves.iter().chain(std::iter::repeat(&0.0)))
            .map(|(mut r, m)| {
                r.change_percent = *m;
                r
            })
            .collect()
    }

    #[test]
    fn big_equity_loser_ranks_first() {
        let stocks = with_moves(AssetClass::Stocks, &[1.0, -40.0, 2.0, -3.0, 4.5]);
        let crypto = with_moves(AssetClass::Crypto, &[-5.0, 3.0, 1.0]);
        let indices = with_moves(AssetClass::Indices, &[0.5, -1.5]);

        let ranked = trending(&stocks, &crypto, &indices);
        assert_eq!(ranked.len(), 8);
        assert_eq!(ranked[0].symbol, "MSFT");
        assert_eq!(ranked[0].change_percent, -40.0);
        for pair in ranked.windows(2) {
            assert!(pair[0].abs_change_percent() >= pair[1].abs_change_percent());
        }
    }

    #[test]
    fn trending_takes_three_three_two() {
        let stocks = seed_records(AssetClass::Stocks);
        let crypto = seed_records(AssetClass::Crypto);
        let indices = seed_records(AssetClass::Indices);

        let ranked = trending(&stocks, &crypto, &indices);
        let symbols: Vec<&str> = ranked.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(
            symbols,
            vec!["AAPL", "MSFT", "GOOGL", "BTC", "ETH", "BNB", "SPX", "DJI"]
        );
    }

    #[test]
    fn trending_handles_short_lists() {
        let stocks = seed_records(AssetClass::Stocks)[..1].to_vec();
        let ranked = trending(&stocks, &[], &[]);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn find_is_case_insensitive() {
        let crypto = seed_records(AssetClass::Crypto);
        let sol = find_symbol(AssetClass::Crypto, &crypto, "sol").unwrap();
        assert_eq!(sol.name, "Solana");

        let err = find_symbol(AssetClass::Crypto, &crypto, "AAPL").unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound { class: AssetClass::Crypto, .. }));
    }

    #[test]
    fn search_matches_symbol_or_name_and_respects_limit() {
        let stocks = seed_records(AssetClass::Stocks);
        let crypto = seed_records(AssetClass::Crypto);
        let indices = seed_records(AssetClass::Indices);
        let all = || {
            vec![
                (AssetClass::Stocks, stocks.as_slice()),
                (AssetClass::Crypto, crypto.as_slice()),
                (AssetClass::Indices, indices.as_slice()),
            ]
        };

        let hits = search(all(), "COIN", DEFAULT_SEARCH_LIMIT);
        let symbols: Vec<&str> = hits.iter().map(|h| h.record.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "BNB", "DOGE"]);
        assert!(hits.iter().all(|h| h.class == AssetClass::Crypto));

        let capped = search(all(), "a", 4);
        assert_eq!(capped.len(), 4);
        assert_eq!(capped[0].record.symbol, "AAPL");

        assert!(search(all(), "   ", 10).is_empty());
    }
}
