// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type TabId = u64;

/// Durable storage keys for the table snapshot.
pub const KEY_TRACKING_ENABLED: &str = "trackingEnabled";
pub const KEY_START_TIME: &str = "startTime";
pub const KEY_TAB_URLS: &str = "tabUrls";

pub const SNAPSHOT_KEYS: [&str; 3] = [KEY_TRACKING_ENABLED, KEY_START_TIME, KEY_TAB_URLS];

/// Identifies one running tick loop. Handles are never reused, so a tick
/// carrying an old handle can be told apart from the live loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingEntry {
    enabled: bool,
    url: Option<String>,
    accrual_start_ms: Option<u64>,
    timer: Option<TimerHandle>,
}

impl TrackingEntry {
    pub fn untracked(url: Option<String>) -> Self {
        Self {
            enabled: false,
            url,
            accrual_start_ms: None,
            timer: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn accrual_start_ms(&self) -> Option<u64> {
        self.accrual_start_ms
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Tracking means enabled with a live window and a tick loop behind it.
    pub fn is_tracking(&self) -> bool {
        self.enabled && self.accrual_start_ms.is_some() && self.timer.is_some()
    }

    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    /// Enter Tracking: window opens at `now_ms`, owned by `timer`.
    pub fn begin_accrual(&mut self, now_ms: u64, timer: TimerHandle) {
        self.enabled = true;
        self.accrual_start_ms = Some(now_ms);
        self.timer = Some(timer);
    }

    /// Leave Tracking. Returns the handle the caller must cancel.
    pub fn end_accrual(&mut self) -> Option<TimerHandle> {
        self.enabled = false;
        self.accrual_start_ms = None;
        self.timer.take()
    }

    /// Move the window boundary forward without leaving Tracking.
    pub fn reset_accrual(&mut self, now_ms: u64) {
        if self.enabled {
            self.accrual_start_ms = Some(now_ms);
        }
    }

    pub fn set_timer(&mut self, timer: TimerHandle) {
        self.timer = Some(timer);
    }
}

/// Authoritative in-memory record of which tabs are accruing time.
///
/// Pure data structure. Timer handles are allocated here but the tasks
/// behind them belong to the ticker set in the daemon.
#[derive(Debug, Clone, Default)]
pub struct TrackingTable {
    entries: BTreeMap<TabId, TrackingEntry>,
    next_handle: u64,
}

impl TrackingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TrackingEntry> {
        self.entries.get(&tab_id)
    }

    pub fn get_mut(&mut self, tab_id: TabId) -> Option<&mut TrackingEntry> {
        self.entries.get_mut(&tab_id)
    }

    pub fn set(&mut self, tab_id: TabId, entry: TrackingEntry) {
        self.entries.insert(tab_id, entry);
    }

    /// Removes the entry and hands it back so its timer can be released.
    pub fn remove(&mut self, tab_id: TabId) -> Option<TrackingEntry> {
        self.entries.remove(&tab_id)
    }

    #[cfg(test)]
    pub fn contains(&self, tab_id: TabId) -> bool {
        self.entries.contains_key(&tab_id)
    }

    /// Create the entry if missing, refresh its url when one is known.
    /// Returns true if anything changed.
    pub fn observe(&mut self, tab_id: TabId, url: Option<&str>) -> bool {
        match self.entries.get_mut(&tab_id) {
            Some(entry) => match url {
                Some(u) if entry.url() != Some(u) => {
                    entry.set_url(Some(u.to_string()));
                    true
                }
                _ => false,
            },
            None => {
                self.entries
                    .insert(tab_id, TrackingEntry::untracked(url.map(str::to_string)));
                true
            }
        }
    }

    pub fn allocate_handle(&mut self) -> TimerHandle {
        self.next_handle = self.next_handle.wrapping_add(1);
        TimerHandle(self.next_handle)
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.entries.keys().copied().collect()
    }

    pub fn tracking_tabs(&self) -> Vec<TabId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_tracking())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, &TrackingEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let mut snap = TableSnapshot::default();

        for (id, entry) in &self.entries {
            snap.tracking_enabled.insert(*id, entry.enabled);
            if let Some(start) = entry.accrual_start_ms {
                snap.start_time.insert(*id, start);
            }
            if let Some(url) = &entry.url {
                snap.tab_urls.insert(*id, url.clone());
            }
        }

        snap
    }

    /// Replace the table contents from a snapshot.
    ///
    /// Timer handles are not persisted; enabled entries come back with
    /// their start instant and no timer, and the caller must start a tick
    /// for each id returned.
    pub fn restore(&mut self, snap: TableSnapshot) -> Vec<TabId> {
        self.entries.clear();

        let mut ids: Vec<TabId> = snap
            .tracking_enabled
            .keys()
            .chain(snap.tab_urls.keys())
            .chain(snap.start_time.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut resume = Vec::new();

        for id in ids {
            let enabled = snap.tracking_enabled.get(&id).copied().unwrap_or(false);
            let start = snap.start_time.get(&id).copied();
            let url = snap.tab_urls.get(&id).cloned();

            let entry = match (enabled, start) {
                (true, Some(start)) => {
                    resume.push(id);
                    TrackingEntry {
                        enabled: true,
                        url,
                        accrual_start_ms: Some(start),
                        timer: None,
                    }
                }
                // enabled without a start instant cannot be resumed faithfully
                _ => TrackingEntry::untracked(url),
            };

            self.set(id, entry);
        }

        resume
    }
}

/// Serialized form of the table, split across the three storage keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    #[serde(rename = "trackingEnabled", default)]
    pub tracking_enabled: BTreeMap<TabId, bool>,
    #[serde(rename = "startTime", default)]
    pub start_time: BTreeMap<TabId, u64>,
    #[serde(rename = "tabUrls", default)]
    pub tab_urls: BTreeMap<TabId, String>,
}

impl TableSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tracking_enabled.is_empty() && self.start_time.is_empty() && self.tab_urls.is_empty()
    }

    pub fn into_map(self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut map = Map::new();
        map.insert(KEY_TRACKING_ENABLED.into(), serde_json::to_value(self.tracking_enabled)?);
        map.insert(KEY_START_TIME.into(), serde_json::to_value(self.start_time)?);
        map.insert(KEY_TAB_URLS.into(), serde_json::to_value(self.tab_urls)?);
        Ok(map)
    }

    /// Missing keys read as empty maps; malformed ones are an error.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        fn field<T: serde::de::DeserializeOwned + Default>(
            map: &Map<String, Value>,
            key: &str,
        ) -> Result<T, serde_json::Error> {
            match map.get(key) {
                Some(v) if !v.is_null() => serde_json::from_value(v.clone()),
                _ => Ok(T::default()),
            }
        }

        Ok(Self {
            tracking_enabled: field(map, KEY_TRACKING_ENABLED)?,
            start_time: field(map, KEY_START_TIME)?,
            tab_urls: field(map, KEY_TAB_URLS)?,
        })
    }
}
