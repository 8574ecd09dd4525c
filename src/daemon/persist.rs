// Author: Dustin Pilgrim
// License: MIT

use tracing::{debug, error, info, warn};

use crate::core::{
    events::Event,
    state::{SNAPSHOT_KEYS, TableSnapshot},
};
use crate::services::{host::TabHost, records::RecordStore, storage::KeyValueStore};

use super::Daemon;

impl<H: TabHost, R: RecordStore, K: KeyValueStore> Daemon<H, R, K> {
    /// Write the whole table under the fixed snapshot keys.
    pub(super) async fn persist(&mut self) -> bool {
        let map = match self.table.snapshot().into_map() {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "failed to encode tracking snapshot");
                return false;
            }
        };

        match self.storage.set(map).await {
            Ok(()) => {
                debug!(tabs = self.table.len(), "tracking snapshot written");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to write tracking snapshot");
                false
            }
        }
    }

    /// Load the last snapshot and restart tick loops for tabs that were
    /// tracking. Without a snapshot, seed the table from the host.
    pub(super) async fn restore(&mut self, now_ms: u64) {
        let snap = match self.storage.get(&SNAPSHOT_KEYS).await {
            Ok(map) => TableSnapshot::from_map(&map).unwrap_or_else(|e| {
                warn!(error = %e, "stored tracking snapshot is malformed, starting empty");
                TableSnapshot::default()
            }),
            Err(e) => {
                warn!(error = %e, "could not read tracking snapshot, starting empty");
                TableSnapshot::default()
            }
        };

        if snap.is_empty() {
            match self.host.query_all_tabs().await {
                Ok(tabs) => {
                    info!(tabs = tabs.len(), "no prior tracking state, seeding from host");
                    self.dispatch(Event::TabsSynced { tabs, now_ms }).await;
                }
                Err(e) => debug!(reason = %e, "no prior tracking state, waiting for first sync"),
            }
            return;
        }

        let resume = self.table.restore(snap);
        let actions = self.manager.resume_restored(&mut self.table, &resume);
        self.exec_actions(actions).await;

        info!(
            tabs = self.table.len(),
            resumed = resume.len(),
            "tracking state restored"
        );
    }
}
