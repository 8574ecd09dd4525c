// Author: Dustin Pilgrim
// License: MIT

mod actions;
mod persist;
mod run;


use tracing::{debug, info, warn};

use crate::core::{
    error::Error,
    events::Event,
    manager::Manager,
    manager_msg::{HostEvent, ManagerMsg},
    state::{TabId, TimerHandle, TrackingTable},
};
use crate::services::{
    host::{HostError, TabHost},
    records::RecordStore,
    storage::KeyValueStore,
    ticker::TickerSet,
    viewer::LiveUpdates,
};

/// Owns the tracking table and every side-effecting collaborator.
///
/// All state changes happen on the daemon task, one message at a time.
pub struct Daemon<H: TabHost, R: RecordStore, K: KeyValueStore> {
    manager: Manager,
    table: TrackingTable,

    host: H,
    records: R,
    storage: K,

    tickers: TickerSet,
    live: LiveUpdates,

    /// Closed intervals waiting for their boundary to reach storage.
    unrecorded: Vec<actions::ClosedInterval>,
}

impl<H: TabHost, R: RecordStore, K: KeyValueStore> Daemon<H, R, K> {
    pub fn new(
        manager: Manager,
        host: H,
        records: R,
        storage: K,
        tickers: TickerSet,
        live: LiveUpdates,
    ) -> Self {
        debug!(
            flush_period_ms = manager.flush_period_ms(),
            tick_interval = ?tickers.interval(),
            "daemon configured"
        );

        Self {
            manager,
            table: TrackingTable::new(),
            host,
            records,
            storage,
            tickers,
            live,
            unrecorded: Vec::new(),
        }
    }

    /// Feed one event through the reconciler and carry out what it asks for.
    async fn dispatch(&mut self, event: Event) {
        let quiet = matches!(event, Event::Tick { .. });
        if !quiet {
            debug!(?event, "incoming");
        }

        let actions = self.manager.handle_event(&mut self.table, event);
        if !quiet && !actions.is_empty() {
            debug!(?actions, "actions");
        }

        self.exec_actions(actions).await;
    }

    /// Returns false once the daemon should stop.
    pub(super) async fn handle_msg(&mut self, msg: ManagerMsg, now_ms: u64) -> bool {
        match msg {
            ManagerMsg::Tick { tab_id, handle } => {
                self.handle_tick(tab_id, handle, now_ms).await;
            }

            ManagerMsg::Host(ev) => {
                self.handle_host_event(ev, now_ms).await;
            }

            ManagerMsg::StartTracking { tab_id, reply } => {
                let out = self.start_tracking(tab_id, now_ms).await;
                let _ = reply.send(out);
            }

            ManagerMsg::StopTracking { tab_id, reply } => {
                let out = self.stop_tracking(tab_id, now_ms).await;
                let _ = reply.send(out);
            }

            ManagerMsg::GetStatus { reply } => {
                let _ = reply.send(self.manager.status(&self.table, now_ms));
            }

            ManagerMsg::History { url, reply } => {
                let out = self
                    .records
                    .query_by_url(&url)
                    .await
                    .map_err(|e| e.to_string());
                let _ = reply.send(out);
            }

            ManagerMsg::Report { start, end, reply } => {
                let out = self
                    .records
                    .query_by_date_range(start, end)
                    .await
                    .map_err(|e| e.to_string());
                let _ = reply.send(out);
            }

            ManagerMsg::Subscribe { reply } => {
                let _ = reply.send(self.live.subscribe());
            }

            ManagerMsg::StopDaemon { reply } => {
                info!("daemon stopping (stop requested via IPC)");
                let _ = reply.send(Ok("Stopping tabtime daemon".to_string()));
                return false;
            }
        }

        true
    }

    async fn handle_tick(&mut self, tab_id: TabId, handle: TimerHandle, now_ms: u64) {
        // stale ticks never reach the host
        if !self
            .table
            .get(tab_id)
            .is_some_and(|e| e.timer() == Some(handle))
        {
            debug!(tab_id, ?handle, "stale tick dropped");
            return;
        }

        match self.host.get_tab(tab_id).await {
            Ok(info) => {
                self.dispatch(Event::Tick {
                    tab_id,
                    handle,
                    live_url: info.url,
                    now_ms,
                })
                .await;
            }
            Err(HostError::NotFound(_)) => {
                info!(tab_id, "tracked tab no longer exists, cleaning up");
                self.dispatch(Event::TabRemoved { tab_id, now_ms }).await;
            }
            Err(HostError::Unavailable(reason)) => {
                debug!(tab_id, %reason, "host unavailable, tick skipped");
            }
        }
    }

    async fn handle_host_event(&mut self, ev: HostEvent, now_ms: u64) {
        let event = match ev {
            HostEvent::Opened { tab_id, url } => Event::TabOpened { tab_id, url, now_ms },

            HostEvent::Activated { tab_id } => match self.host.get_tab(tab_id).await {
                Ok(info) => Event::TabActivated {
                    tab_id,
                    url: info.url,
                    now_ms,
                },
                Err(HostError::NotFound(_)) => {
                    // other tabs still get their windows closed
                    self.dispatch(Event::TabActivated {
                        tab_id,
                        url: None,
                        now_ms,
                    })
                    .await;
                    Event::TabRemoved { tab_id, now_ms }
                }
                Err(HostError::Unavailable(reason)) => {
                    debug!(tab_id, %reason, "activated tab url unknown");
                    Event::TabActivated {
                        tab_id,
                        url: None,
                        now_ms,
                    }
                }
            },

            HostEvent::Updated { tab_id, url } => Event::TabUpdated { tab_id, url, now_ms },

            HostEvent::Removed { tab_id } => Event::TabRemoved { tab_id, now_ms },

            HostEvent::Synced => match self.host.query_all_tabs().await {
                Ok(tabs) => Event::TabsSynced { tabs, now_ms },
                Err(e) => {
                    warn!(error = %e, "tab sync requested but host cannot list tabs");
                    return;
                }
            },

            HostEvent::Suspending => {
                info!("host suspending, flushing open windows");
                Event::Suspending { now_ms }
            }
        };

        self.dispatch(event).await;
    }

    async fn start_tracking(&mut self, tab_id: TabId, now_ms: u64) -> Result<String, String> {
        let info = match self.host.get_tab(tab_id).await {
            Ok(info) => info,
            Err(HostError::NotFound(_)) => {
                // drop whatever we still hold for it
                self.dispatch(Event::TabRemoved { tab_id, now_ms }).await;
                return Err(Error::TabNotFound(tab_id).to_string());
            }
            Err(e) => return Err(e.to_string()),
        };

        if self.table.get(tab_id).is_some_and(|e| e.is_tracking()) {
            return Ok(format!("Tab {tab_id} is already tracked"));
        }

        let url = info.url.clone();
        self.dispatch(Event::StartTracking {
            tab_id,
            url: info.url,
            now_ms,
        })
        .await;

        info!(tab_id, url = ?url, "tracking started");
        match url {
            Some(u) => Ok(format!("Tracking tab {tab_id} ({u})")),
            None => Ok(format!("Tracking tab {tab_id}")),
        }
    }

    async fn stop_tracking(&mut self, tab_id: TabId, now_ms: u64) -> Result<String, String> {
        let was_enabled = self.table.get(tab_id).is_some_and(|e| e.enabled());

        self.dispatch(Event::StopTracking { tab_id, now_ms }).await;

        if was_enabled {
            info!(tab_id, "tracking stopped");
            Ok(format!("Stopped tracking tab {tab_id}"))
        } else {
            Ok(format!("Tab {tab_id} is not tracked"))
        }
    }

    /// Flush every open window and persist, then drop all tick loops.
    ///
    /// Tracking stays enabled in storage so the next start resumes it.
    pub(super) async fn shutdown(&mut self, now_ms: u64) {
        self.dispatch(Event::Suspending { now_ms }).await;
        if !self.tickers.is_empty() {
            debug!(tickers = self.tickers.len(), "stopping tick loops");
            self.tickers.abort_all();
        }
        info!(tabs = self.table.len(), "daemon stopped");
    }
}
