// Author: Dustin Pilgrim
// License: MIT

use tracing::{debug, error, trace, warn};

use crate::core::{action::Action, state::TabId};
use crate::services::{
    host::TabHost, records::RecordStore, storage::KeyValueStore, viewer::PublishOutcome,
};

use super::Daemon;

/// An interval the reconciler closed but the record store has not seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ClosedInterval {
    tab_id: TabId,
    url: String,
    duration_ms: u64,
}

impl<H: TabHost, R: RecordStore, K: KeyValueStore> Daemon<H, R, K> {
    /// Carry out one batch of actions.
    ///
    /// The snapshot is written before any record is appended. A record is
    /// only appended once the moved boundary is durable, so a restart
    /// never replays an interval that already reached the store. While
    /// the snapshot cannot be written, closed intervals are held back and
    /// retried with the next batch.
    pub(super) async fn exec_actions(&mut self, actions: Vec<Action>) {
        let mut persist = false;

        for action in actions {
            match action {
                Action::Flush {
                    tab_id,
                    url,
                    duration_ms,
                } => self.unrecorded.push(ClosedInterval {
                    tab_id,
                    url,
                    duration_ms,
                }),

                Action::StartTicker { tab_id, handle } => {
                    self.tickers.start(tab_id, handle);
                }

                Action::StopTicker { tab_id } => {
                    self.tickers.stop(tab_id);
                }

                Action::Publish(update) => {
                    if let PublishOutcome::Delivered(n) = self.live.publish(update) {
                        trace!(viewers = n, "live update published");
                    }
                }

                Action::Persist => persist = true,
            }
        }

        if !persist && self.unrecorded.is_empty() {
            return;
        }

        if !self.persist().await {
            if !self.unrecorded.is_empty() {
                warn!(
                    held = self.unrecorded.len(),
                    "holding closed intervals until the snapshot is written"
                );
            }
            return;
        }

        self.record_closed().await;
    }

    async fn record_closed(&mut self) {
        for closed in std::mem::take(&mut self.unrecorded) {
            let ClosedInterval {
                tab_id,
                url,
                duration_ms,
            } = closed;

            match self.records.append(&url, duration_ms).await {
                Ok(id) => debug!(tab_id, id, %url, duration_ms, "interval recorded"),
                Err(e) => {
                    error!(tab_id, %url, duration_ms, error = %e, "failed to record interval")
                }
            }
        }
    }
}
