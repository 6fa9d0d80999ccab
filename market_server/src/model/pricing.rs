//! Price mutation routine.
//!
//! One tick over a class perturbs every record by a random fraction drawn from
//! `[-volatility, +volatility]`, recomputes the derived change fields together,
//! and bumps the volume magnitude by a small positive amount. Randomness sits
//! behind `PriceDraw` so runs can be made deterministic.

use chrono::{DateTime, Utc};
use market_common::AssetRecord;
use market_common::record::{finite_or_zero, round_to};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound (exclusive) of the per-tick volume increment.
pub const MAX_VOLUME_BUMP: f64 = 0.1;

/// Source of the random numbers used by a tick.
pub trait PriceDraw: Send {
    /// Fractional price change, uniform in `[-volatility, +volatility]`.
    fn percent(&mut self, volatility: f64) -> f64;
    /// Volume magnitude increment, uniform in `[0, MAX_VOLUME_BUMP)`.
    fn volume_bump(&mut self) -> f64;
}

/// Uniform draws from a standard RNG.
pub struct RandomDraw {
    rng: StdRng,
}

impl RandomDraw {
    /// RNG seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible RNG for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceDraw for RandomDraw {
    fn percent(&mut self, volatility: f64) -> f64 {
        if volatility <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(-volatility..=volatility)
    }

    fn volume_bump(&mut self) -> f64 {
        self.rng.random_range(0.0..MAX_VOLUME_BUMP)
    }
}

/// Always draws the same point of the volatility band.
///
/// `position` is in `[-1, 1]`: `1.0` is the maximum upward move, `-1.0` the
/// maximum downward move, `0.0` no move at all.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw {
    position: f64,
    volume_bump: f64,
}

impl FixedDraw {
    /// Fixed draw at `position` of the band with a constant volume increment.
    pub fn new(position: f64, volume_bump: f64) -> Self {
        Self {
            position: position.clamp(-1.0, 1.0),
            volume_bump: volume_bump.clamp(0.0, MAX_VOLUME_BUMP),
        }
    }

    /// Maximum upward move every tick.
    pub fn max() -> Self {
        Self::new(1.0, 0.0)
    }

    /// Maximum downward move every tick.
    pub fn min() -> Self {
        Self::new(-1.0, 0.0)
    }

    /// No price move and no volume change.
    pub fn flat() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl PriceDraw for FixedDraw {
    fn percent(&mut self, volatility: f64) -> f64 {
        volatility * self.position
    }

    fn volume_bump(&mut self) -> f64 {
        self.volume_bump
    }
}

/// Applies one tick to every record in place.
///
/// `floor`, when set, bounds the new price from below. A previous price of zero
/// yields a change percent of `0.0` instead of a non-finite value.
pub fn mutate_prices(
    records: &mut [AssetRecord],
    volatility: f64,
    floor: Option<f64>,
    draw: &mut dyn PriceDraw,
    now: DateTime<Utc>,
) {
    for record in records.iter_mut() {
        record.previous_price = record.price;

        let raw = draw.percent(volatility);
        let mut price = round_to(record.price * (1.0 + raw), 2);
        if let Some(floor) = floor {
            price = price.max(floor);
        }
        record.price = price;
        record.change = round_to(record.price - record.previous_price, 2);
        record.change_percent =
            finite_or_zero(round_to(record.change / record.previous_price * 100.0, 2));
        record.last_update = now;

        record.volume.increment(draw.volume_bump());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_common::Volume;

    fn record(symbol: &str, price: f64) -> AssetRecord {
        AssetRecord::new(symbol, symbol, price, Volume::new(10.0, 'M'), "1B")
    }

    #[test]
    fn zero_volatility_leaves_price_unchanged() {
        let mut records = vec![record("AAPL", 182.63)];
        mutate_prices(&mut records, 0.0, None, &mut RandomDraw::seeded(7), Utc::now());
        assert_eq!(records[0].price, 182.63);
        assert_eq!(records[0].previous_price, 182.63);
        assert_eq!(records[0].change, 0.0);
        assert_eq!(records[0].change_percent, 0.0);
    }

    #[test]
    fn maximum_draw_moves_by_full_volatility() {
        let mut records = vec![record("BTC", 100.0)];
        mutate_prices(&mut records, 0.5, None, &mut FixedDraw::max(), Utc::now());
        assert_eq!(records[0].price, 150.0);
        assert_eq!(records[0].change, 50.0);
        assert_eq!(records[0].change_percent, 50.0);
    }

    #[test]
    fn previous_price_is_exactly_one_tick_old() {
        let mut records = vec![record("ETH", 1850.75), record("SOL", 124.56)];
        let mut draw = RandomDraw::seeded(42);
        for _ in 0..20 {
            let before: Vec<f64> = records.iter().map(|r| r.price).collect();
            mutate_prices(&mut records, 0.5, None, &mut draw, Utc::now());
            for (record, price) in records.iter().zip(before) {
                assert_eq!(record.previous_price, price);
            }
        }
    }

    #[test]
    fn change_percent_is_consistent_with_change() {
        let mut records = vec![record("SPX", 5021.84), record("DJI", 38996.35)];
        let mut draw = RandomDraw::seeded(3);
        for _ in 0..50 {
            mutate_prices(&mut records, 0.1, None, &mut draw, Utc::now());
            for r in &records {
                let expected = round_to(r.change / r.previous_price * 100.0, 2);
                assert!((r.change_percent - expected).abs() < 1e-9, "{r:?}");
                assert!((r.change - round_to(r.price - r.previous_price, 2)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn draws_stay_inside_the_band() {
        let mut draw = RandomDraw::seeded(11);
        for _ in 0..1000 {
            let p = draw.percent(0.2);
            assert!((-0.2..=0.2).contains(&p));
            let bump = draw.volume_bump();
            assert!((0.0..MAX_VOLUME_BUMP).contains(&bump));
        }
    }

    #[test]
    fn volume_keeps_unit_and_grows() {
        let mut records = vec![record("DOT", 6.78)];
        mutate_prices(&mut records, 0.5, None, &mut FixedDraw::new(0.0, 0.1), Utc::now());
        assert_eq!(records[0].volume.to_string(), "10.1M");
    }

    #[test]
    fn zero_previous_price_gives_finite_change_percent() {
        let mut records = vec![record("DOGE", 0.0)];
        mutate_prices(&mut records, 0.5, None, &mut FixedDraw::max(), Utc::now());
        assert_eq!(records[0].price, 0.0);
        assert_eq!(records[0].change_percent, 0.0);
        assert!(records[0].change_percent.is_finite());
    }

    #[test]
    fn floor_bounds_price_from_below() {
        let mut records = vec![record("ADA", 0.01)];
        for _ in 0..5 {
            mutate_prices(&mut records, 0.5, Some(0.01), &mut FixedDraw::min(), Utc::now());
        }
        assert_eq!(records[0].price, 0.01);
    }
}
