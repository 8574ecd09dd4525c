// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashSet;

use tracing::debug;

use crate::core::{
    action::Action,
    events::{Event, TabInfo},
    state::{TabId, TrackingTable},
};

use super::{Manager, push_persist};

impl Manager {
    pub fn handle_event(&mut self, table: &mut TrackingTable, event: Event) -> Vec<Action> {
        let now_ms = event.now_ms();
        let mut out = Vec::new();

        match event {
            Event::Tick {
                tab_id,
                handle,
                live_url,
                ..
            } => {
                out.extend(self.on_tick(table, tab_id, handle, live_url.as_deref(), now_ms));
            }

            Event::StartTracking { tab_id, url, .. } => {
                self.close_before_retarget(table, tab_id, url.as_deref(), now_ms, &mut out);
                table.observe(tab_id, url.as_deref());

                if table.get(tab_id).is_some_and(|e| e.is_tracking()) {
                    debug!(tab_id, "already tracking");
                    return out;
                }

                let handle = table.allocate_handle();
                if let Some(entry) = table.get_mut(tab_id) {
                    entry.begin_accrual(now_ms, handle);
                    debug!(tab_id, url = ?entry.url(), "tracking started");
                    out.push(Action::StartTicker { tab_id, handle });
                    push_persist(&mut out);
                }
            }

            Event::StopTracking { tab_id, .. } => {
                let Some(entry) = table.get_mut(tab_id) else {
                    debug!(tab_id, "stop for unknown tab");
                    return out;
                };

                if !entry.enabled() && entry.timer().is_none() {
                    return out;
                }

                if entry.enabled() {
                    self.flush_into(tab_id, entry, now_ms, &mut out);
                }
                entry.end_accrual();

                debug!(tab_id, "tracking stopped");
                out.push(Action::StopTicker { tab_id });
                push_persist(&mut out);
            }

            Event::TabOpened { tab_id, url, .. } => {
                self.close_before_retarget(table, tab_id, url.as_deref(), now_ms, &mut out);
                if table.observe(tab_id, url.as_deref()) {
                    push_persist(&mut out);
                }
            }

            Event::TabActivated { tab_id, url, .. } => {
                // Close every open window under the url it accrued for,
                // before the activated tab's url is refreshed.
                for id in table.tracking_tabs() {
                    if let Some(entry) = table.get_mut(id) {
                        self.flush_and_reset(id, entry, now_ms, &mut out);
                        push_persist(&mut out);
                    }
                }

                if table.observe(tab_id, url.as_deref()) {
                    push_persist(&mut out);
                }

                self.ensure_ticker(table, tab_id, now_ms, &mut out);
            }

            Event::TabUpdated { tab_id, url, .. } => {
                let Some(new_url) = url else {
                    if table.observe(tab_id, None) {
                        push_persist(&mut out);
                    }
                    return out;
                };

                let Some(entry) = table.get_mut(tab_id) else {
                    table.observe(tab_id, Some(&new_url));
                    push_persist(&mut out);
                    return out;
                };

                if entry.url() == Some(new_url.as_str()) {
                    return out;
                }

                if entry.is_tracking() {
                    self.flush_and_reset(tab_id, entry, now_ms, &mut out);
                }

                debug!(tab_id, url = %new_url, "navigated");
                entry.set_url(Some(new_url));
                push_persist(&mut out);
            }

            Event::TabRemoved { tab_id, .. } => {
                self.remove_tab(table, tab_id, now_ms, &mut out);
            }

            Event::TabsSynced { tabs, .. } => {
                self.sync_tabs(table, tabs, now_ms, &mut out);
            }

            Event::Suspending { .. } => {
                for id in table.tracking_tabs() {
                    if let Some(entry) = table.get_mut(id) {
                        self.flush_and_reset(id, entry, now_ms, &mut out);
                    }
                }
                push_persist(&mut out);
            }
        }

        out
    }

    /// A tracking tab about to take a different url closes its window
    /// under the url it accrued for.
    fn close_before_retarget(
        &mut self,
        table: &mut TrackingTable,
        tab_id: TabId,
        url: Option<&str>,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) {
        let Some(new_url) = url else {
            return;
        };
        let Some(entry) = table.get_mut(tab_id) else {
            return;
        };

        if entry.is_tracking() && entry.url() != Some(new_url) {
            self.flush_and_reset(tab_id, entry, now_ms, out);
            push_persist(out);
        }
    }

    /// An enabled tab without a tick loop gets one back.
    fn ensure_ticker(
        &mut self,
        table: &mut TrackingTable,
        tab_id: TabId,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) {
        let needs_loop = table
            .get(tab_id)
            .is_some_and(|e| e.enabled() && e.timer().is_none());
        if !needs_loop {
            return;
        }

        let handle = table.allocate_handle();
        if let Some(entry) = table.get_mut(tab_id) {
            // a window that is still open keeps its start
            if entry.accrual_start_ms().is_some() {
                entry.set_timer(handle);
            } else {
                entry.begin_accrual(now_ms, handle);
            }
            out.push(Action::StartTicker { tab_id, handle });
            push_persist(out);
        }
    }

    fn remove_tab(
        &mut self,
        table: &mut TrackingTable,
        tab_id: TabId,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) {
        let Some(entry) = table.remove(tab_id) else {
            return;
        };

        if entry.enabled() {
            self.flush_into(tab_id, &entry, now_ms, out);
        }
        if entry.enabled() || entry.timer().is_some() {
            out.push(Action::StopTicker { tab_id });
        }

        debug!(tab_id, "tab removed");
        push_persist(out);
    }

    fn sync_tabs(
        &mut self,
        table: &mut TrackingTable,
        tabs: Vec<TabInfo>,
        now_ms: u64,
        out: &mut Vec<Action>,
    ) {
        let live: HashSet<TabId> = tabs.iter().map(|t| t.id).collect();

        for id in table.tab_ids() {
            if !live.contains(&id) {
                self.remove_tab(table, id, now_ms, out);
            }
        }

        for tab in tabs {
            let tracking = table.get(tab.id).is_some_and(|e| e.is_tracking());
            let drifted = tracking
                && table
                    .get(tab.id)
                    .is_some_and(|e| tab.url.is_some() && e.url() != tab.url.as_deref());

            // a tracked tab whose url moved while we weren't told: close
            // the window under the old url first
            if drifted {
                if let Some(entry) = table.get_mut(tab.id) {
                    self.flush_and_reset(tab.id, entry, now_ms, out);
                }
            }

            if table.observe(tab.id, tab.url.as_deref()) {
                push_persist(out);
            }
        }
    }
}
