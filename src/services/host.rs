// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::core::{events::TabInfo, state::TabId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The tab is gone. Callers treat this as a cleanup signal.
    #[error("tab {0} does not exist")]
    NotFound(TabId),

    /// The host cannot answer right now; nothing can be concluded.
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the browser's tabs.
pub trait TabHost: Send + Sync + 'static {
    fn get_tab(&self, tab_id: TabId) -> impl Future<Output = Result<TabInfo, HostError>> + Send;

    fn query_all_tabs(&self) -> impl Future<Output = Result<Vec<TabInfo>, HostError>> + Send;
}

#[derive(Debug, Default)]
struct Mirror {
    synced: bool,
    tabs: BTreeMap<TabId, Option<String>>,
}

/// Host view built from what the browser bridge pushes over IPC.
///
/// Until the bridge sends a full sync, tabs it never mentioned are
/// `Unavailable` rather than `NotFound`, so a freshly restarted daemon
/// does not clean up tabs it simply hasn't heard about yet.
#[derive(Debug, Clone, Default)]
pub struct BridgeHost {
    inner: Arc<RwLock<Mirror>>,
}

impl BridgeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn write<R>(&self, f: impl FnOnce(&mut Mirror) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn read<R>(&self, f: impl FnOnce(&Mirror) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    pub fn open(&self, tab_id: TabId, url: Option<String>) {
        self.write(|m| {
            m.tabs.insert(tab_id, url);
        });
    }

    /// Record a navigation. A `None` url only marks the tab as present.
    pub fn update(&self, tab_id: TabId, url: Option<String>) {
        self.write(|m| {
            let slot = m.tabs.entry(tab_id).or_insert(None);
            if url.is_some() {
                *slot = url;
            }
        });
    }

    pub fn remove(&self, tab_id: TabId) {
        self.write(|m| {
            m.tabs.remove(&tab_id);
        });
    }

    pub fn sync(&self, tabs: Vec<TabInfo>) {
        self.write(|m| {
            m.tabs = tabs.into_iter().map(|t| (t.id, t.url)).collect();
            m.synced = true;
        });
    }

    pub fn is_synced(&self) -> bool {
        self.read(|m| m.synced)
    }

    fn lookup(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.read(|m| match m.tabs.get(&tab_id) {
            Some(url) => Ok(TabInfo {
                id: tab_id,
                url: url.clone(),
            }),
            None if m.synced => Err(HostError::NotFound(tab_id)),
            None => Err(HostError::Unavailable(format!(
                "tab {tab_id} not reported by the browser bridge yet"
            ))),
        })
    }

    fn all(&self) -> Result<Vec<TabInfo>, HostError> {
        self.read(|m| {
            if !m.synced {
                return Err(HostError::Unavailable(
                    "browser bridge has not synced its tabs".to_string(),
                ));
            }
            Ok(m
                .tabs
                .iter()
                .map(|(id, url)| TabInfo {
                    id: *id,
                    url: url.clone(),
                })
                .collect())
        })
    }
}

impl TabHost for BridgeHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.lookup(tab_id)
    }

    async fn query_all_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        self.all()
    }
}
