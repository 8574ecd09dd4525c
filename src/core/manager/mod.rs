// Author: Dustin Pilgrim
// License: MIT

mod accrual;
mod engine;
mod snapshot;

use tracing::{debug, error};

use crate::core::{
    action::Action,
    error::IntervalError,
    state::{TabId, TrackingEntry, TrackingTable},
};

pub const DEFAULT_FLUSH_PERIOD_MS: u64 = 10_000;

/// Event reconciler and accrual arithmetic.
///
/// Holds no per-tab state of its own; everything lives in the
/// `TrackingTable` passed into each call. Side effects are returned as
/// `Action`s for the daemon to carry out.
#[derive(Debug)]
pub struct Manager {
    flush_period_ms: u64,
    rejected_intervals: u64,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_PERIOD_MS)
    }
}

impl Manager {
    pub fn new(flush_period_ms: u64) -> Self {
        Self {
            flush_period_ms: flush_period_ms.max(1),
            rejected_intervals: 0,
        }
    }

    pub fn flush_period_ms(&self) -> u64 {
        self.flush_period_ms
    }

    /// Number of negative intervals refused since startup.
    pub fn rejected_intervals(&self) -> u64 {
        self.rejected_intervals
    }

    /// Restart tick loops for entries restored with tracking enabled.
    /// Their restored start instant is kept.
    pub fn resume_restored(&mut self, table: &mut TrackingTable, tab_ids: &[TabId]) -> Vec<Action> {
        let mut out = Vec::new();

        for &tab_id in tab_ids {
            let handle = table.allocate_handle();
            let Some(entry) = table.get_mut(tab_id) else {
                continue;
            };
            if !entry.enabled() || entry.accrual_start_ms().is_none() {
                continue;
            }

            entry.set_timer(handle);
            debug!(tab_id, start_ms = ?entry.accrual_start_ms(), "resuming restored accrual");
            out.push(Action::StartTicker { tab_id, handle });
        }

        out
    }

    /// Turn `[accrual_start, now)` into a flush.
    ///
    /// Zero-length windows and entries without a url yield nothing.
    fn close_interval(
        tab_id: TabId,
        entry: &TrackingEntry,
        now_ms: u64,
    ) -> Result<Option<Action>, IntervalError> {
        let Some(start_ms) = entry.accrual_start_ms() else {
            return Ok(None);
        };

        if now_ms < start_ms {
            return Err(IntervalError::Negative {
                tab_id,
                start_ms,
                end_ms: now_ms,
            });
        }

        let duration_ms = now_ms - start_ms;
        if duration_ms == 0 {
            debug!(tab_id, "zero-length interval, nothing to flush");
            return Ok(None);
        }

        let Some(url) = entry.url() else {
            debug!(tab_id, duration_ms, "interval has no url to attribute, dropped");
            return Ok(None);
        };

        Ok(Some(Action::Flush {
            tab_id,
            url: url.to_string(),
            duration_ms,
        }))
    }

    /// Close the open window into `out`. Returns false if it was refused.
    fn flush_into(
        &mut self,
        tab_id: TabId,
        entry: &TrackingEntry,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) -> bool {
        match Self::close_interval(tab_id, entry, now_ms) {
            Ok(Some(flush)) => {
                out.push(flush);
                true
            }
            Ok(None) => true,
            Err(e) => {
                self.rejected_intervals += 1;
                error!(error = %e, "refusing to record interval");
                false
            }
        }
    }

    /// Close the open window and start a new one at `now_ms`.
    fn flush_and_reset(
        &mut self,
        tab_id: TabId,
        entry: &mut TrackingEntry,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) {
        self.flush_into(tab_id, entry, now_ms, out);
        entry.reset_accrual(now_ms);
    }
}

fn push_persist(out: &mut Vec<Action>) {
    if !out.contains(&Action::Persist) {
        out.push(Action::Persist);
    }
}
