// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

use crate::core::{state::TabId, utils::format_duration_ms};

/// Snapshot returned from the daemon for `tabtime status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub tabs: Vec<TabStatus>,
    pub flush_period_ms: u64,
    pub rejected_intervals: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabStatus {
    pub tab_id: TabId,
    pub url: Option<String>,
    pub tracking: bool,
    /// Time in the open window, not yet flushed.
    pub pending_ms: u64,
}

impl StatusSnapshot {
    pub fn tracking_count(&self) -> usize {
        self.tabs.iter().filter(|t| t.tracking).count()
    }

    pub fn pretty(&self) -> String {
        let mut out = format!(
            "{} tab(s), {} tracking\n",
            self.tabs.len(),
            self.tracking_count()
        );

        for tab in &self.tabs {
            let url = tab.url.as_deref().unwrap_or("<unknown>");
            if tab.tracking {
                out.push_str(&format!(
                    "  [{}] * {} (+{})\n",
                    tab.tab_id,
                    url,
                    format_duration_ms(tab.pending_ms)
                ));
            } else {
                out.push_str(&format!("  [{}]   {}\n", tab.tab_id, url));
            }
        }

        if self.rejected_intervals > 0 {
            out.push_str(&format!(
                "rejected intervals: {}\n",
                self.rejected_intervals
            ));
        }

        out
    }
}
