// Author: Dustin Pilgrim
// License: MIT

use tracing::{debug, error};

use crate::core::{
    action::{Action, LiveUpdate},
    state::{TabId, TimerHandle, TrackingTable},
    utils::split_hms,
};

use super::{Manager, push_persist};

impl Manager {
    /// One accrual tick for `tab_id`, with `live_url` freshly read from the host.
    ///
    /// Flushes whenever the open window has reached the flush period. The
    /// whole window goes out, not a single period, so a late tick never
    /// carries time past a boundary.
    pub(super) fn on_tick(
        &mut self,
        table: &mut TrackingTable,
        tab_id: TabId,
        handle: TimerHandle,
        live_url: Option<&str>,
        now_ms: u64,
    ) -> Vec<Action> {
        let mut out = Vec::new();

        let Some(entry) = table.get_mut(tab_id) else {
            return out;
        };

        if entry.timer() != Some(handle) {
            debug!(tab_id, ?handle, "stale tick ignored");
            return out;
        }

        if !entry.enabled() {
            return out;
        }

        let Some(url) = entry.url().map(str::to_string) else {
            return out;
        };

        if live_url != Some(url.as_str()) {
            debug!(tab_id, recorded = %url, live = ?live_url, "url drift, waiting for update event");
            return out;
        }

        let Some(start_ms) = entry.accrual_start_ms() else {
            return out;
        };

        if now_ms < start_ms {
            self.rejected_intervals += 1;
            error!(tab_id, start_ms, now_ms, "accrual window starts in the future, resetting");
            entry.reset_accrual(now_ms);
            push_persist(&mut out);
            return out;
        }

        let elapsed_ms = now_ms - start_ms;

        if elapsed_ms >= self.flush_period_ms {
            out.push(Action::Flush {
                tab_id,
                url: url.clone(),
                duration_ms: elapsed_ms,
            });
            entry.reset_accrual(now_ms);
            push_persist(&mut out);
        }

        let (hours, minutes, seconds) = split_hms(elapsed_ms);
        out.push(Action::Publish(LiveUpdate {
            tab_id,
            url,
            hours,
            minutes,
            seconds,
        }));

        out
    }
}
