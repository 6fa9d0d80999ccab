//! Drives a shared `BotDesk` one round per `BotModel::round_interval`.

use std::sync::{Arc, Mutex};

use log::error;
use market_common::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::model::bot_desk::BotDesk;
use crate::scheduler::PeriodicTask;

/// Background simulation of a bot desk.
pub struct BotRunner {
    task: PeriodicTask,
}

impl BotRunner {
    /// Starts simulating `desk`. The desk stays usable from other threads.
    pub fn start(desk: Arc<Mutex<BotDesk>>) -> Result<Self> {
        let interval = desk.lock()?.model().round_interval;
        let mut rng = StdRng::from_os_rng();
        let task = PeriodicTask::spawn("bot-desk", interval, move || match desk.lock() {
            Ok(mut desk) => {
                desk.simulate_round(&mut rng);
                true
            }
            Err(e) => {
                error!("Bot desk lock poisoned: {}", e);
                false
            }
        })?;
        Ok(Self { task })
    }

    /// Stops the simulation and waits for the thread.
    pub fn stop(&mut self) {
        self.task.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::bot_desk::{BotEvent, BotModel};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn runner_produces_trades_until_stopped() {
        let model = BotModel {
            trade_probability: 1.0,
            round_interval: Duration::from_millis(10),
            ..BotModel::default()
        };
        let desk = Arc::new(Mutex::new(BotDesk::with_demo_bots(model)));
        let events = desk.lock().unwrap().events();

        let mut runner = BotRunner::start(Arc::clone(&desk)).unwrap();
        thread::sleep(Duration::from_millis(100));
        runner.stop();

        let traded = events
            .try_iter()
            .filter(|e| matches!(e, BotEvent::Traded { .. }))
            .count();
        assert!(traded >= 3, "only {traded} trades");
        let settled = desk.lock().unwrap().bots()[0].trades;
        thread::sleep(Duration::from_millis(40));
        assert_eq!(desk.lock().unwrap().bots()[0].trades, settled);
    }
}
