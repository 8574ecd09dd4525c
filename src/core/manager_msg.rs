// Author: Dustin Pilgrim
// License: MIT

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, oneshot};

use crate::core::{
    action::LiveUpdate,
    info::StatusSnapshot,
    state::{TabId, TimerHandle},
};
use crate::services::records::TimeRecord;

/// Lifecycle notifications from the browser bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Opened { tab_id: TabId, url: Option<String> },
    Activated { tab_id: TabId },
    Updated { tab_id: TabId, url: Option<String> },
    Removed { tab_id: TabId },
    /// The bridge replaced its full tab list.
    Synced,
    Suspending,
}

#[derive(Debug)]
pub enum ManagerMsg {
    Host(HostEvent),

    Tick {
        tab_id: TabId,
        handle: TimerHandle,
    },

    StartTracking {
        tab_id: TabId,
        reply: oneshot::Sender<Result<String, String>>,
    },

    StopTracking {
        tab_id: TabId,
        reply: oneshot::Sender<Result<String, String>>,
    },

    GetStatus {
        reply: oneshot::Sender<StatusSnapshot>,
    },

    History {
        url: String,
        reply: oneshot::Sender<Result<Vec<TimeRecord>, String>>,
    },

    Report {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reply: oneshot::Sender<Result<Vec<TimeRecord>, String>>,
    },

    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<LiveUpdate>>,
    },

    StopDaemon {
        reply: oneshot::Sender<Result<String, String>>,
    },
}
