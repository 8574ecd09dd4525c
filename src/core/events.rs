// Author: Dustin Pilgrim
// License: MIT

use serde::Deserialize;

use crate::core::state::{TabId, TimerHandle};

/// A tab as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One accrual tick, already resolved against the host.
    Tick {
        tab_id: TabId,
        handle: TimerHandle,
        live_url: Option<String>,
        now_ms: u64,
    },

    /// `url` is what the host reported when the command was accepted.
    StartTracking {
        tab_id: TabId,
        url: Option<String>,
        now_ms: u64,
    },
    StopTracking {
        tab_id: TabId,
        now_ms: u64,
    },

    TabOpened {
        tab_id: TabId,
        url: Option<String>,
        now_ms: u64,
    },
    TabActivated {
        tab_id: TabId,
        url: Option<String>,
        now_ms: u64,
    },
    /// Navigation. `url` is absent when the host reported a change
    /// that did not touch the address (title, favicon, ...).
    TabUpdated {
        tab_id: TabId,
        url: Option<String>,
        now_ms: u64,
    },
    TabRemoved {
        tab_id: TabId,
        now_ms: u64,
    },

    /// Full list of open tabs from the host.
    TabsSynced {
        tabs: Vec<TabInfo>,
        now_ms: u64,
    },

    /// The host is about to unload us.
    Suspending {
        now_ms: u64,
    },
}

impl Event {
    pub fn now_ms(&self) -> u64 {
        match self {
            Event::Tick { now_ms, .. }
            | Event::StartTracking { now_ms, .. }
            | Event::StopTracking { now_ms, .. }
            | Event::TabOpened { now_ms, .. }
            | Event::TabActivated { now_ms, .. }
            | Event::TabUpdated { now_ms, .. }
            | Event::TabRemoved { now_ms, .. }
            | Event::TabsSynced { now_ms, .. }
            | Event::Suspending { now_ms } => *now_ms,
        }
    }
}
