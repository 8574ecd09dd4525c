// Author: Dustin Pilgrim
// License: MIT

use crate::core::{
    info::{StatusSnapshot, TabStatus},
    state::TrackingTable,
};

use super::Manager;

impl Manager {
    pub fn status(&self, table: &TrackingTable, now_ms: u64) -> StatusSnapshot {
        let tabs = table
            .iter()
            .map(|(tab_id, entry)| TabStatus {
                tab_id,
                url: entry.url().map(str::to_string),
                tracking: entry.is_tracking(),
                pending_ms: entry
                    .accrual_start_ms()
                    .map(|start| now_ms.saturating_sub(start))
                    .unwrap_or(0),
            })
            .collect();

        StatusSnapshot {
            tabs,
            flush_period_ms: self.flush_period_ms,
            rejected_intervals: self.rejected_intervals,
        }
    }
}
