// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

use crate::core::state::TabId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A command named a tab the host does not know about.
    #[error("tab {0} not found")]
    TabNotFound(TabId),

    /// A closed interval could not be turned into a record.
    #[error(transparent)]
    InvalidInterval(#[from] IntervalError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// The window closed before it opened (clock skew or a logic defect).
    #[error("negative interval for tab {tab_id}: opened at {start_ms}ms, closed at {end_ms}ms")]
    Negative {
        tab_id: TabId,
        start_ms: u64,
        end_ms: u64,
    },
}
