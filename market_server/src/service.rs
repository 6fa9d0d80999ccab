//! The market data service.
//!
//! `MarketDataService` owns the record lists of every asset class, the
//! subscriber registry and the update scheduler. It is a cheap cloneable handle:
//! the composition root builds one, starts it, and passes clones to consumers.
//!
//! Flow of one tick:
//! 1. the scheduler fires for a class;
//! 2. the class's records are mutated in place under that class's lock and a
//!    fresh `Snapshot` is taken;
//! 3. the lock is released and the snapshot is fanned out to the class's
//!    subscribers.
//!
//! Callers never get the live lists: getters return owned copies and
//! subscribers receive immutable snapshots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use log::{error, info};
use market_common::seeds::seed_records;
use market_common::{AssetClass, AssetRecord, FeedConfig, Result};

use crate::model::pricing::{PriceDraw, RandomDraw, mutate_prices};
use crate::model::query::{self, SearchHit};
use crate::model::registry::{Snapshot, SubscriberRegistry, Subscription};
use crate::scheduler::Scheduler;

/// Records of one class plus the number of ticks applied so far.
struct ClassBook {
    records: Vec<AssetRecord>,
    /// Starts at 1 for the seeded state and grows by one per tick.
    generation: u64,
}

impl ClassBook {
    fn new(records: Vec<AssetRecord>) -> Mutex<Self> {
        Mutex::new(ClassBook {
            records,
            generation: 1,
        })
    }

    fn snapshot(&self) -> (u64, Snapshot) {
        (self.generation, Snapshot::from(self.records.as_slice()))
    }
}

struct Shared {
    stocks: Mutex<ClassBook>,
    crypto: Mutex<ClassBook>,
    indices: Mutex<ClassBook>,
    registry: SubscriberRegistry,
    draw: Mutex<Box<dyn PriceDraw>>,
    config: FeedConfig,
    running: AtomicBool,
    scheduler: Mutex<Option<Scheduler>>,
}

impl Shared {
    fn book(&self, class: AssetClass) -> &Mutex<ClassBook> {
        match class {
            AssetClass::Stocks => &self.stocks,
            AssetClass::Crypto => &self.crypto,
            AssetClass::Indices => &self.indices,
        }
    }

    fn snapshot(&self, class: AssetClass) -> Result<(u64, Snapshot)> {
        Ok(self.book(class).lock()?.snapshot())
    }

    fn tick(&self, class: AssetClass) -> Result<usize> {
        let schedule = self.config.schedule(class);
        let (generation, snapshot) = {
            let mut book = self.book(class).lock()?;
            let mut draw = self.draw.lock()?;
            mutate_prices(
                &mut book.records,
                schedule.volatility,
                self.config.price_floor,
                draw.as_mut(),
                Utc::now(),
            );
            book.generation += 1;
            book.snapshot()
        };
        Ok(self.registry.notify(class, generation, &snapshot))
    }
}

/// Builder for a `MarketDataService` with custom seeds, randomness or config.
pub struct MarketDataServiceBuilder {
    config: FeedConfig,
    draw: Box<dyn PriceDraw>,
    stocks: Option<Vec<AssetRecord>>,
    crypto: Option<Vec<AssetRecord>>,
    indices: Option<Vec<AssetRecord>>,
}

impl MarketDataServiceBuilder {
    /// Replaces the feed configuration.
    pub fn config(mut self, config: FeedConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the random source.
    pub fn draw<D: PriceDraw + 'static>(mut self, draw: D) -> Self {
        self.draw = Box::new(draw);
        self
    }

    /// Replaces the seed list of `class`.
    pub fn records(mut self, class: AssetClass, records: Vec<AssetRecord>) -> Self {
        match class {
            AssetClass::Stocks => self.stocks = Some(records),
            AssetClass::Crypto => self.crypto = Some(records),
            AssetClass::Indices => self.indices = Some(records),
        }
        self
    }

    /// Validates the configuration and builds the (stopped) service.
    pub fn build(self) -> Result<MarketDataService> {
        self.config.validate()?;
        Ok(MarketDataService::from_parts(
            self.config,
            self.draw,
            [self.stocks, self.crypto, self.indices],
        ))
    }
}

/// Simulated multi-class market data feed with subscriber fan-out.
#[derive(Clone)]
pub struct MarketDataService {
    shared: Arc<Shared>,
}

impl MarketDataService {
    /// Default seeds, default cadences, OS-seeded randomness. Not started.
    pub fn new() -> Self {
        Self::from_parts(
            FeedConfig::default(),
            Box::new(RandomDraw::new()),
            [None, None, None],
        )
    }

    fn from_parts(
        config: FeedConfig,
        draw: Box<dyn PriceDraw>,
        [stocks, crypto, indices]: [Option<Vec<AssetRecord>>; 3],
    ) -> Self {
        let book = |records: Option<Vec<AssetRecord>>, class: AssetClass| {
            ClassBook::new(records.unwrap_or_else(|| seed_records(class)))
        };
        Self {
            shared: Arc::new(Shared {
                stocks: book(stocks, AssetClass::Stocks),
                crypto: book(crypto, AssetClass::Crypto),
                indices: book(indices, AssetClass::Indices),
                registry: SubscriberRegistry::new(),
                draw: Mutex::new(draw),
                config,
                running: AtomicBool::new(false),
                scheduler: Mutex::new(None),
            }),
        }
    }

    /// Starts a builder from the defaults.
    pub fn builder() -> MarketDataServiceBuilder {
        MarketDataServiceBuilder {
            config: FeedConfig::default(),
            draw: Box::new(RandomDraw::new()),
            stocks: None,
            crypto: None,
            indices: None,
        }
    }

    /// Configuration the service runs with.
    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    /// Starts the per-class update timers. Does nothing if already running.
    pub fn start_updates(&self) -> Result<()> {
        let mut slot = self.shared.scheduler.lock()?;
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let spawned = Scheduler::spawn(&self.shared.config, move |class| {
            let Some(shared) = weak.upgrade() else {
                return false;
            };
            if let Err(e) = shared.tick(class) {
                error!("Tick for {} failed: {}", class, e);
            }
            true
        });
        match spawned {
            Ok(scheduler) => {
                *slot = Some(scheduler);
                info!("Market data updates started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Cancels every update timer and waits for the scheduler to exit. Idempotent.
    pub fn stop_updates(&self) -> Result<()> {
        let scheduler = {
            let mut slot = self.shared.scheduler.lock()?;
            self.shared.running.store(false, Ordering::Release);
            slot.take()
        };
        if let Some(mut scheduler) = scheduler {
            scheduler.stop();
            info!("Market data updates stopped");
        }
        Ok(())
    }

    /// `true` between `start_updates` and `stop_updates`.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Runs one tick for `class` right now: mutate, then fan out.
    ///
    /// Returns how many subscribers were notified.
    pub fn tick(&self, class: AssetClass) -> Result<usize> {
        self.shared.tick(class)
    }

    /// Registers `on_update` for `class` and immediately hands it the current
    /// snapshot. Dropping the returned handle unsubscribes.
    pub fn subscribe<F>(&self, class: AssetClass, on_update: F) -> Result<Subscription>
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let subscription = self.shared.registry.register(class, on_update);
        let (generation, snapshot) = self.shared.snapshot(class)?;
        subscription.deliver_initial(generation, &snapshot);
        Ok(subscription)
    }

    /// Like [`subscribe`](Self::subscribe) with the class given by name.
    ///
    /// Unknown names are rejected with `UnknownAssetClass`.
    pub fn subscribe_by_name<F>(&self, class: &str, on_update: F) -> Result<Subscription>
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let class = AssetClass::parse(class)?;
        self.subscribe(class, on_update)
    }

    /// Number of live subscribers of `class`.
    pub fn subscriber_count(&self, class: AssetClass) -> usize {
        self.shared.registry.len(class)
    }

    /// Owned copy of the current records of `class`.
    pub fn get_data(&self, class: AssetClass) -> Result<Vec<AssetRecord>> {
        Ok(self.shared.book(class).lock()?.records.clone())
    }

    /// Top movers across all classes; see [`query::trending`].
    pub fn get_trending_data(&self) -> Result<Vec<AssetRecord>> {
        let stocks = self.get_data(AssetClass::Stocks)?;
        let crypto = self.get_data(AssetClass::Crypto)?;
        let indices = self.get_data(AssetClass::Indices)?;
        Ok(query::trending(&stocks, &crypto, &indices))
    }

    /// Current record of `symbol` in `class`, matched case-insensitively.
    pub fn find(&self, class: AssetClass, symbol: &str) -> Result<AssetRecord> {
        let book = self.shared.book(class).lock()?;
        query::find_symbol(class, &book.records, symbol)
    }

    /// Searches symbols and names of every class, stocks first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let stocks = self.get_data(AssetClass::Stocks)?;
        let crypto = self.get_data(AssetClass::Crypto)?;
        let indices = self.get_data(AssetClass::Indices)?;
        Ok(query::search(
            [
                (AssetClass::Stocks, stocks.as_slice()),
                (AssetClass::Crypto, crypto.as_slice()),
                (AssetClass::Indices, indices.as_slice()),
            ],
            query,
            limit,
        ))
    }
}

impl Default for MarketDataService {
    fn default() -> Self {
        Self::new()
    }
}
