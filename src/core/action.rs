// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

use crate::core::state::{TabId, TimerHandle};

/// Live-update payload for viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUpdate {
    pub tab_id: TabId,
    pub url: String,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a closed interval to the record store.
    ///
    /// Only ever built from a validated, strictly positive duration.
    Flush {
        tab_id: TabId,
        url: String,
        duration_ms: u64,
    },

    /// Start the tick loop for a tab, replacing any existing one.
    StartTicker { tab_id: TabId, handle: TimerHandle },

    /// Cancel the tick loop for a tab.
    StopTicker { tab_id: TabId },

    /// Best-effort notification to attached viewers.
    Publish(LiveUpdate),

    /// Write the table snapshot to durable storage.
    Persist,
}
