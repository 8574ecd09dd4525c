// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::broadcast;

use crate::core::action::LiveUpdate;

pub const DEFAULT_LIVE_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered(usize),
    /// Nobody is watching. Not an error.
    NoSubscriber,
}

/// Fan-out of live updates to attached viewers.
///
/// Slow viewers lag and lose the oldest updates; the publisher never waits.
#[derive(Debug, Clone)]
pub struct LiveUpdates {
    tx: broadcast::Sender<LiveUpdate>,
}

impl Default for LiveUpdates {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_BUFFER)
    }
}

impl LiveUpdates {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.tx.subscribe()
    }

    pub fn publish(&self, update: LiveUpdate) -> PublishOutcome {
        match self.tx.send(update) {
            Ok(n) => PublishOutcome::Delivered(n),
            Err(_) => PublishOutcome::NoSubscriber,
        }
    }
}
