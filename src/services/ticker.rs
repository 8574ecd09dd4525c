// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashMap;

use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use crate::core::manager_msg::ManagerMsg;
use crate::core::state::{TabId, TimerHandle};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

struct RunningTicker {
    handle: TimerHandle,
    task: JoinHandle<()>,
}

/// Per-tab tick loops of the accrual engine.
///
/// At most one loop per tab. Each loop only sends `ManagerMsg::Tick`; the
/// daemon does all the accounting. Aborting a loop does not recall ticks
/// already queued, which is why every tick carries its handle.
pub struct TickerSet {
    tx: Sender<ManagerMsg>,
    interval: Duration,
    running: HashMap<TabId, RunningTicker>,
}

impl TickerSet {
    pub fn new(tx: Sender<ManagerMsg>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            running: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the loop for `tab_id` under `handle`.
    ///
    /// No-op if that exact loop is already running; a loop under any other
    /// handle is cancelled first. Returns whether a task was spawned.
    pub fn start(&mut self, tab_id: TabId, handle: TimerHandle) -> bool {
        if let Some(existing) = self.running.get(&tab_id) {
            if existing.handle == handle && !existing.task.is_finished() {
                return false;
            }
        }

        self.stop(tab_id);

        let task = tokio::spawn(run_ticker(self.tx.clone(), tab_id, handle, self.interval));
        self.running.insert(tab_id, RunningTicker { handle, task });
        debug!(tab_id, ?handle, "ticker started");
        true
    }

    pub fn stop(&mut self, tab_id: TabId) -> bool {
        match self.running.remove(&tab_id) {
            Some(t) => {
                t.task.abort();
                debug!(tab_id, handle = ?t.handle, "ticker stopped");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, tab_id: TabId) -> bool {
        self.running
            .get(&tab_id)
            .is_some_and(|t| !t.task.is_finished())
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn abort_all(&mut self) {
        for (_, t) in self.running.drain() {
            t.task.abort();
        }
    }
}

impl Drop for TickerSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}

async fn run_ticker(tx: Sender<ManagerMsg>, tab_id: TabId, handle: TimerHandle, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        // If the daemon is gone, stop.
        if tx.send(ManagerMsg::Tick { tab_id, handle }).await.is_err() {
            break;
        }
    }
}
