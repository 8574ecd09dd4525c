// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::core::{manager_msg::ManagerMsg, utils::now_ms};
use crate::services::{host::TabHost, records::RecordStore, storage::KeyValueStore};

use super::Daemon;

impl<H: TabHost, R: RecordStore, K: KeyValueStore> Daemon<H, R, K> {
    pub async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ManagerMsg>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("daemon starting");

        self.restore(now_ms()).await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("daemon stopping (shutdown requested)");
                        break;
                    }
                }

                maybe = rx.recv() => {
                    let Some(msg) = maybe else {
                        info!("daemon stopping (event channel closed)");
                        break;
                    };

                    if !self.handle_msg(msg, now_ms()).await {
                        break;
                    }
                }
            }
        }

        self.shutdown(now_ms()).await;
    }
}
