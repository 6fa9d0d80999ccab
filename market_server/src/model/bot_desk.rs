//! Simulated trading bot desk.
//!
//! The desk keeps a roster of pseudo-random "trading bots" and advances them in
//! rounds. Nothing is traded: every round, each active bot may record one
//! synthetic trade whose outcome and size are drawn from the parameters in
//! [`BotModel`]. State changes are published as [`BotEvent`]s over crossbeam
//! channels; how (or whether) they are shown to a user is up to the listener.

use std::ops::Range;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use market_common::record::round_to;
use market_common::{MarketDataError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Run state of a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BotStatus {
    /// Trading every round.
    Active,
    /// Never started.
    Inactive,
    /// Stopped by the user.
    Paused,
}

/// Coarse three-step setting used for risk and trade frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

/// User-tunable settings of a bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSettings {
    /// Risk appetite, drives the warm-up success rate.
    pub risk_level: Level,
    /// Upper bound of a single trade's notional.
    pub max_trade_amount: f64,
    /// Trading frequency, drives the warm-up trade count.
    pub trade_frequency: Level,
    /// Loss on a failed trade, percent of the notional.
    pub stop_loss: f64,
    /// Gain on a successful trade, percent of the notional.
    pub take_profit: f64,
    /// Symbols the bot may trade.
    pub allowed_markets: Vec<String>,
}

/// Partial settings update; `None` fields are left as they are.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSettingsPatch {
    pub risk_level: Option<Level>,
    pub max_trade_amount: Option<f64>,
    pub trade_frequency: Option<Level>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub allowed_markets: Option<Vec<String>>,
}

impl BotSettings {
    fn apply(&mut self, patch: BotSettingsPatch) {
        if let Some(v) = patch.risk_level {
            self.risk_level = v;
        }
        if let Some(v) = patch.max_trade_amount {
            self.max_trade_amount = v;
        }
        if let Some(v) = patch.trade_frequency {
            self.trade_frequency = v;
        }
        if let Some(v) = patch.stop_loss {
            self.stop_loss = v;
        }
        if let Some(v) = patch.take_profit {
            self.take_profit = v;
        }
        if let Some(v) = patch.allowed_markets {
            self.allowed_markets = v;
        }
    }
}

/// One simulated bot and its running statistics.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingBot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: BotStatus,
    /// Cumulative profit, two decimals.
    pub profit: f64,
    /// Profit relative to the previous profit (or 100 when that was not positive), one decimal.
    pub profit_percent: f64,
    pub trades: u32,
    /// Percent of successful trades, whole number.
    pub success_rate: f64,
    pub markets: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub settings: BotSettings,
}

/// Everything needed to create a bot; statistics start at zero.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBot {
    pub name: String,
    pub description: String,
    pub status: BotStatus,
    pub markets: Vec<String>,
    pub settings: BotSettings,
}

/// Structured notification of a desk state change.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    /// A bot was added to the roster.
    Created { id: String, name: String },
    /// A bot became active.
    Started { id: String, name: String },
    /// A bot was paused.
    Paused { id: String, name: String },
    /// Settings were merged into a bot.
    SettingsUpdated { id: String, name: String },
    /// A bot was removed.
    Deleted { id: String, name: String },
    /// A bot recorded one synthetic trade.
    Traded {
        id: String,
        successful: bool,
        profit_loss: f64,
        total_profit: f64,
    },
}

/// Parameters of the bot simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct BotModel {
    /// Chance that an active bot trades in a given round.
    pub trade_probability: f64,
    /// Time between two rounds.
    pub round_interval: Duration,
    /// Warm-up success rate ranges by risk level (low, medium, high).
    pub warmup_success_rate: [Range<u32>; 3],
    /// Warm-up trade count ranges by trade frequency (low, medium, high).
    pub warmup_trades: [Range<u32>; 3],
    /// Base used for profit percent when the previous profit was not positive.
    pub profit_percent_base: f64,
}

impl Default for BotModel {
    fn default() -> Self {
        BotModel {
            trade_probability: 0.3,
            round_interval: Duration::from_secs(5),
            warmup_success_rate: [70..80, 60..75, 50..70],
            warmup_trades: [1..4, 3..8, 5..13],
            profit_percent_base: 100.0,
        }
    }
}

fn level_index(level: Level) -> usize {
    match level {
        Level::Low => 0,
        Level::Medium => 1,
        Level::High => 2,
    }
}

fn draw_in<R: Rng + ?Sized>(rng: &mut R, range: &Range<u32>) -> u32 {
    if range.is_empty() {
        range.start
    } else {
        rng.random_range(range.clone())
    }
}

/// Roster of simulated bots.
pub struct BotDesk {
    bots: Vec<TradingBot>,
    model: BotModel,
    listeners: Vec<Sender<BotEvent>>,
}

impl BotDesk {
    /// Empty desk.
    pub fn new(model: BotModel) -> Self {
        Self {
            bots: Vec::new(),
            model,
            listeners: Vec::new(),
        }
    }

    /// Desk pre-filled with the four demo bots.
    pub fn with_demo_bots(model: BotModel) -> Self {
        let mut desk = Self::new(model);
        desk.bots = demo_bots(Utc::now());
        desk
    }

    /// Simulation parameters.
    pub fn model(&self) -> &BotModel {
        &self.model
    }

    /// Opens a new event stream. Streams whose receiver is dropped are pruned.
    pub fn events(&mut self) -> Receiver<BotEvent> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    fn emit(&mut self, event: BotEvent) {
        debug!("Bot event: {:?}", event);
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// All bots in creation order.
    pub fn bots(&self) -> &[TradingBot] {
        &self.bots
    }

    /// Bot by id.
    pub fn get(&self, id: &str) -> Result<&TradingBot> {
        self.bots
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| MarketDataError::BotNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut TradingBot> {
        self.bots
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| MarketDataError::BotNotFound(id.to_string()))
    }

    /// Number of active bots.
    pub fn active_count(&self) -> usize {
        self.bots.iter().filter(|b| b.status == BotStatus::Active).count()
    }

    /// Sum of all bots' profit.
    pub fn total_profit(&self) -> f64 {
        self.bots.iter().map(|b| b.profit).sum()
    }

    /// Trade-weighted success rate over all bots, whole percent.
    pub fn success_rate(&self) -> f64 {
        let trades: f64 = self.bots.iter().map(|b| f64::from(b.trades)).sum();
        if trades == 0.0 {
            return 0.0;
        }
        let successful: f64 = self
            .bots
            .iter()
            .map(|b| f64::from(b.trades) * b.success_rate / 100.0)
            .sum();
        (successful / trades * 100.0).round()
    }

    /// Activates a bot. A bot without trades is warmed up with a starting
    /// success rate by risk level and a starting trade count by frequency.
    pub fn start<R: Rng + ?Sized>(&mut self, id: &str, rng: &mut R) -> Result<()> {
        let model = self.model.clone();
        let bot = self.get_mut(id)?;
        if bot.trades == 0 {
            let risk = level_index(bot.settings.risk_level);
            let frequency = level_index(bot.settings.trade_frequency);
            bot.success_rate = f64::from(draw_in(rng, &model.warmup_success_rate[risk]));
            bot.trades = draw_in(rng, &model.warmup_trades[frequency]);
        }
        bot.status = BotStatus::Active;
        bot.last_updated = Utc::now();
        let event = BotEvent::Started {
            id: bot.id.clone(),
            name: bot.name.clone(),
        };
        self.emit(event);
        Ok(())
    }

    /// Pauses a bot.
    pub fn pause(&mut self, id: &str) -> Result<()> {
        let bot = self.get_mut(id)?;
        bot.status = BotStatus::Paused;
        bot.last_updated = Utc::now();
        let event = BotEvent::Paused {
            id: bot.id.clone(),
            name: bot.name.clone(),
        };
        self.emit(event);
        Ok(())
    }

    /// Merges `patch` into a bot's settings; applies to future trades.
    pub fn update_settings(&mut self, id: &str, patch: BotSettingsPatch) -> Result<()> {
        let bot = self.get_mut(id)?;
        bot.settings.apply(patch);
        bot.last_updated = Utc::now();
        let event = BotEvent::SettingsUpdated {
            id: bot.id.clone(),
            name: bot.name.clone(),
        };
        self.emit(event);
        Ok(())
    }

    /// Adds a bot with zeroed statistics and returns its id.
    pub fn create(&mut self, new_bot: NewBot) -> String {
        let now = Utc::now();
        let base = format!("bot-{}", now.timestamp_millis());
        let mut id = base.clone();
        let mut suffix = 1;
        while self.bots.iter().any(|b| b.id == id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.bots.push(TradingBot {
            id: id.clone(),
            name: new_bot.name.clone(),
            description: new_bot.description,
            status: new_bot.status,
            profit: 0.0,
            profit_percent: 0.0,
            trades: 0,
            success_rate: 0.0,
            markets: new_bot.markets,
            created_at: now,
            last_updated: now,
            settings: new_bot.settings,
        });
        self.emit(BotEvent::Created {
            id: id.clone(),
            name: new_bot.name,
        });
        id
    }

    /// Removes a bot.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let index = self
            .bots
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| MarketDataError::BotNotFound(id.to_string()))?;
        let bot = self.bots.remove(index);
        self.emit(BotEvent::Deleted {
            id: bot.id,
            name: bot.name,
        });
        Ok(())
    }

    /// Advances every active bot by one round. Returns the number of trades made.
    pub fn simulate_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let trade_probability = self.model.trade_probability.clamp(0.0, 1.0);
        let base = self.model.profit_percent_base;
        let mut events = Vec::new();

        for bot in self.bots.iter_mut().filter(|b| b.status == BotStatus::Active) {
            if !rng.random_bool(trade_probability) {
                continue;
            }
            let successful = rng.random_bool((bot.success_rate / 100.0).clamp(0.0, 1.0));
            let amount = if bot.settings.max_trade_amount > 0.0 {
                rng.random_range(0.0..bot.settings.max_trade_amount)
            } else {
                0.0
            };
            let profit_loss = if successful {
                amount * bot.settings.take_profit / 100.0
            } else {
                -amount * bot.settings.stop_loss / 100.0
            };

            let previous_profit = bot.profit;
            let new_trades = bot.trades + 1;
            let new_profit = previous_profit + profit_loss;
            let wins = bot.success_rate / 100.0 * f64::from(bot.trades) + f64::from(u8::from(successful));
            let reference = if previous_profit > 0.0 { previous_profit } else { base };

            bot.trades = new_trades;
            bot.profit = round_to(new_profit, 2);
            bot.profit_percent = round_to(new_profit / reference * 100.0, 1);
            bot.success_rate = round_to(wins / f64::from(new_trades) * 100.0, 0);
            bot.last_updated = Utc::now();

            events.push(BotEvent::Traded {
                id: bot.id.clone(),
                successful,
                profit_loss: round_to(profit_loss, 2),
                total_profit: bot.profit,
            });
        }

        let traded = events.len();
        for event in events {
            self.emit(event);
        }
        traded
    }
}

fn demo_bot(
    now: DateTime<Utc>,
    (id, name, description): (&str, &str, &str),
    status: BotStatus,
    (profit, profit_percent, trades, success_rate): (f64, f64, u32, f64),
    markets: &[&str],
    age_days: i64,
    settings: BotSettings,
) -> TradingBot {
    TradingBot {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        status,
        profit,
        profit_percent,
        trades,
        success_rate,
        markets: markets.iter().map(|s| s.to_string()).collect(),
        created_at: now - chrono::Duration::days(age_days),
        last_updated: now,
        settings,
    }
}

fn settings(
    risk_level: Level,
    max_trade_amount: f64,
    trade_frequency: Level,
    (stop_loss, take_profit): (f64, f64),
    allowed: &[&str],
) -> BotSettings {
    BotSettings {
        risk_level,
        max_trade_amount,
        trade_frequency,
        stop_loss,
        take_profit,
        allowed_markets: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

fn demo_bots(now: DateTime<Utc>) -> Vec<TradingBot> {
    vec![
        demo_bot(
            now,
            ("bot1", "Crypto Momentum", "Follows momentum indicators for crypto trading"),
            BotStatus::Active,
            (845.22, 12.4, 48, 72.0),
            &["BTC", "ETH", "SOL"],
            18,
            settings(Level::Medium, 500.0, Level::Medium, (5.0, 10.0), &["BTC", "ETH", "SOL", "ADA", "DOT"]),
        ),
        demo_bot(
            now,
            ("bot2", "Stock Swing Trader", "Captures short-term price swings in stocks"),
            BotStatus::Active,
            (325.18, 5.8, 62, 65.0),
            &["AAPL", "MSFT", "GOOGL", "AMZN"],
            14,
            settings(
                Level::Medium,
                1000.0,
                Level::High,
                (3.0, 8.0),
                &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA"],
            ),
        ),
        demo_bot(
            now,
            ("bot3", "Index Trend Follower", "Follows major index trends with low risk"),
            BotStatus::Active,
            (74.92, 2.1, 14, 64.0),
            &["SPX", "DJI", "IXIC"],
            10,
            settings(Level::Low, 2000.0, Level::Low, (2.0, 5.0), &["SPX", "DJI", "IXIC", "RUT", "FTSE"]),
        ),
        demo_bot(
            now,
            ("bot4", "Meme Coin Hunter", "Identifies and trades emerging meme coins"),
            BotStatus::Inactive,
            (0.0, 0.0, 0, 0.0),
            &["DOGE", "SHIB", "PEPE"],
            5,
            settings(Level::High, 300.0, Level::High, (10.0, 20.0), &["DOGE", "SHIB", "PEPE", "FLOKI", "BONK"]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn new_bot(name: &str) -> NewBot {
        NewBot {
            name: name.to_string(),
            description: "test bot".to_string(),
            status: BotStatus::Inactive,
            markets: vec!["BTC".to_string()],
            settings: settings(Level::High, 100.0, Level::Low, (10.0, 20.0), &["BTC"]),
        }
    }

    fn always_trading() -> BotModel {
        BotModel {
            trade_probability: 1.0,
            ..BotModel::default()
        }
    }

    #[test]
    fn demo_desk_aggregates() {
        let desk = BotDesk::with_demo_bots(BotModel::default());
        assert_eq!(desk.bots().len(), 4);
        assert_eq!(desk.active_count(), 3);
        assert!((desk.total_profit() - 1245.32).abs() < 1e-9);
        // (48*0.72 + 62*0.65 + 14*0.64) / 124 = 67.6%
        assert_eq!(desk.success_rate(), 68.0);
    }

    #[test]
    fn empty_desk_has_zero_success_rate() {
        let desk = BotDesk::new(BotModel::default());
        assert_eq!(desk.success_rate(), 0.0);
        assert_eq!(desk.total_profit(), 0.0);
    }

    #[test]
    fn starting_a_fresh_bot_warms_it_up() {
        let mut desk = BotDesk::new(BotModel::default());
        let events = desk.events();
        let id = desk.create(new_bot("Fresh"));
        let mut rng = StdRng::seed_from_u64(1);
        desk.start(&id, &mut rng).unwrap();

        let bot = desk.get(&id).unwrap();
        assert_eq!(bot.status, BotStatus::Active);
        assert!((50.0..70.0).contains(&bot.success_rate), "{}", bot.success_rate);
        assert!((1..4).contains(&bot.trades), "{}", bot.trades);

        let received: Vec<BotEvent> = events.try_iter().collect();
        assert!(matches!(received[0], BotEvent::Created { .. }));
        assert!(matches!(received[1], BotEvent::Started { .. }));
    }

    #[test]
    fn restarting_keeps_existing_statistics() {
        let mut desk = BotDesk::with_demo_bots(BotModel::default());
        let mut rng = StdRng::seed_from_u64(2);
        desk.pause("bot1").unwrap();
        assert_eq!(desk.get("bot1").unwrap().status, BotStatus::Paused);
        desk.start("bot1", &mut rng).unwrap();
        let bot = desk.get("bot1").unwrap();
        assert_eq!(bot.trades, 48);
        assert_eq!(bot.success_rate, 72.0);
    }

    #[test]
    fn settings_patch_merges_present_fields() {
        let mut desk = BotDesk::with_demo_bots(BotModel::default());
        desk.update_settings(
            "bot2",
            BotSettingsPatch {
                stop_loss: Some(4.0),
                risk_level: Some(Level::High),
                ..BotSettingsPatch::default()
            },
        )
        .unwrap();
        let settings = &desk.get("bot2").unwrap().settings;
        assert_eq!(settings.stop_loss, 4.0);
        assert_eq!(settings.risk_level, Level::High);
        assert_eq!(settings.take_profit, 8.0);
        assert_eq!(settings.max_trade_amount, 1000.0);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut desk = BotDesk::new(BotModel::default());
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(desk.pause("nope"), Err(MarketDataError::BotNotFound(_))));
        assert!(desk.start("nope", &mut rng).is_err());
        assert!(desk.delete("nope").is_err());
    }

    #[test]
    fn created_ids_are_unique() {
        let mut desk = BotDesk::new(BotModel::default());
        let a = desk.create(new_bot("A"));
        let b = desk.create(new_bot("B"));
        assert_ne!(a, b);
        desk.delete(&a).unwrap();
        assert_eq!(desk.bots().len(), 1);
        assert_eq!(desk.bots()[0].id, b);
    }

    #[test]
    fn certain_winner_gains_take_profit() {
        let mut desk = BotDesk::new(always_trading());
        let id = desk.create(new_bot("Winner"));
        let mut rng = StdRng::seed_from_u64(4);
        desk.start(&id, &mut rng).unwrap();
        {
            let bot = desk.bots.iter_mut().find(|b| b.id == id).unwrap();
            bot.success_rate = 100.0;
        }
        let events = desk.events();
        let trades_before = desk.get(&id).unwrap().trades;

        assert_eq!(desk.simulate_round(&mut rng), 1);
        let bot = desk.get(&id).unwrap();
        assert_eq!(bot.trades, trades_before + 1);
        assert_eq!(bot.success_rate, 100.0);
        assert!(bot.profit >= 0.0 && bot.profit <= 20.0);

        match events.try_recv().unwrap() {
            BotEvent::Traded { successful, profit_loss, .. } => {
                assert!(successful);
                assert!(profit_loss >= 0.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn certain_loser_pays_stop_loss() {
        let mut desk = BotDesk::new(always_trading());
        let id = desk.create(new_bot("Loser"));
        {
            let bot = desk.bots.iter_mut().find(|b| b.id == id).unwrap();
            bot.status = BotStatus::Active;
            bot.trades = 10;
            bot.success_rate = 0.0;
        }
        let mut rng = StdRng::seed_from_u64(5);
        desk.simulate_round(&mut rng);
        let bot = desk.get(&id).unwrap();
        assert_eq!(bot.trades, 11);
        assert_eq!(bot.success_rate, 0.0);
        assert!(bot.profit <= 0.0 && bot.profit >= -10.0);
    }

    #[test]
    fn inactive_and_paused_bots_do_not_trade() {
        let mut desk = BotDesk::with_demo_bots(always_trading());
        for id in ["bot1", "bot2", "bot3"] {
            desk.pause(id).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(desk.simulate_round(&mut rng), 0);
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let mut desk = BotDesk::with_demo_bots(BotModel::default());
        let kept = desk.events();
        drop(desk.events());
        desk.pause("bot1").unwrap();
        assert_eq!(desk.listeners.len(), 1);
        assert_eq!(kept.len(), 1);
    }
}
