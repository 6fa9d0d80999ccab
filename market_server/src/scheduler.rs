//! Cancellable periodic scheduling.
//!
//! `Scheduler` runs one background thread that multiplexes a periodic timer per
//! asset class with a stop channel, using crossbeam `select!`. Every class keeps
//! its own cadence, and because a single thread drives all of them no two ticks
//! ever run at the same time. `PeriodicTask` is the single-interval variant used
//! for trending polls and the bot desk.
//!
//! Shutdown:
//! - `stop()` raises a cancellation flag, closes the stop channel and joins the
//!   thread. A tick that is already executing runs to completion; the flag is
//!   checked before each tick so none starts afterwards.
//! - Dropping the handle only signals the thread; it never blocks.
//! - The tick callback may also end the loop by returning `false`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, never, select, tick, unbounded};
use log::{debug, info, warn};
use market_common::{AssetClass, FeedConfig, Result};

struct StopSignal {
    cancelled: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StopSignal {
    fn new(cancelled: Arc<AtomicBool>, stop_tx: Sender<()>, handle: JoinHandle<()>) -> Self {
        Self {
            cancelled,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    fn signal(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.stop_tx.take();
    }

    fn stop(&mut self) {
        self.signal();
        if let Some(handle) = self.handle.take() {
            // Stopping from inside a tick callback must not join its own thread.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                warn!("Thread {} panicked before shutdown", name);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        self.signal();
    }
}

fn timer(interval: Duration) -> Receiver<std::time::Instant> {
    if interval.is_zero() { never() } else { tick(interval) }
}

/// Background driver of the three per-class tick timers.
pub struct Scheduler {
    signal: StopSignal,
}

impl Scheduler {
    /// Spawns the scheduler thread.
    ///
    /// `on_tick` is called with the class whose timer fired; returning `false`
    /// ends the loop.
    pub fn spawn<F>(config: &FeedConfig, mut on_tick: F) -> Result<Self>
    where
        F: FnMut(AssetClass) -> bool + Send + 'static,
    {
        let stocks = timer(config.schedule(AssetClass::Stocks).interval());
        let crypto = timer(config.schedule(AssetClass::Crypto).interval());
        let indices = timer(config.schedule(AssetClass::Indices).interval());
        let (stop_tx, stop_rx) = unbounded::<()>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::Builder::new()
            .name("market-scheduler".to_string())
            .spawn(move || {
                info!("Market scheduler started (Thread ID: {:?})", thread::current().id());
                loop {
                    let class = select! {
                        recv(stop_rx) -> _ => break,
                        recv(stocks) -> _ => AssetClass::Stocks,
                        recv(crypto) -> _ => AssetClass::Crypto,
                        recv(indices) -> _ => AssetClass::Indices,
                    };
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    debug!("Tick: {}", class);
                    if !on_tick(class) {
                        break;
                    }
                }
                info!("Market scheduler stopped");
            })?;

        Ok(Self {
            signal: StopSignal::new(cancelled, stop_tx, handle),
        })
    }

    /// Cancels all timers and waits for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.signal.stop();
    }

    /// `true` while the thread is alive.
    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }
}

/// A single repeating task on its own thread.
pub struct PeriodicTask {
    signal: StopSignal,
}

impl PeriodicTask {
    /// Spawns a thread named `name` that calls `on_tick` every `interval` until
    /// stopped or until `on_tick` returns `false`.
    pub fn spawn<F>(name: &str, interval: Duration, mut on_tick: F) -> Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let ticker = timer(interval);
        let (stop_tx, stop_rx) = unbounded::<()>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task_name = name.to_string();

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!("{} started, every {:?}", task_name, interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        if flag.load(Ordering::Acquire) || !on_tick() {
                            break;
                        }
                    }
                }
            }
            debug!("{} stopped", task_name);
        })?;

        Ok(Self {
            signal: StopSignal::new(cancelled, stop_tx, handle),
        })
    }

    /// Stops the task and waits for its thread. Idempotent.
    pub fn stop(&mut self) {
        self.signal.stop();
    }

    /// `true` while the thread is alive.
    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_common::ClassSchedule;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn fast_config() -> FeedConfig {
        FeedConfig {
            stocks: ClassSchedule { interval_ms: 30, volatility: 0.2 },
            crypto: ClassSchedule { interval_ms: 10, volatility: 0.5 },
            indices: ClassSchedule { interval_ms: 50, volatility: 0.1 },
            ..FeedConfig::default()
        }
    }

    #[test]
    fn classes_tick_at_their_own_cadence() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut scheduler = Scheduler::spawn(&fast_config(), move |class| {
            sink.lock().unwrap().push(class);
            true
        })
        .unwrap();

        thread::sleep(Duration::from_millis(400));
        scheduler.stop();

        let seen = seen.lock().unwrap();
        let count = |c| seen.iter().filter(|&&x| x == c).count();
        assert!(count(AssetClass::Crypto) > count(AssetClass::Stocks));
        assert!(count(AssetClass::Stocks) > count(AssetClass::Indices));
        assert!(count(AssetClass::Indices) >= 1);
    }

    #[test]
    fn no_ticks_after_stop_and_stop_is_idempotent() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut scheduler = Scheduler::spawn(&fast_config(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        scheduler.stop();
        assert!(!scheduler.is_running());
        let after_stop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(80));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
        scheduler.stop();
    }

    #[test]
    fn callback_can_end_the_loop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut task = PeriodicTask::spawn("test-task", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst) < 2
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert!(!task.is_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        task.stop();
    }

    #[test]
    fn dropping_a_task_stops_it() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let task = PeriodicTask::spawn("dropped-task", Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();
        drop(task);
        thread::sleep(Duration::from_millis(30));
        let settled = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), settled);
    }
}
