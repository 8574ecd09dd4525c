// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::mpsc;
use tracing::info;

use crate::core::{
    events::TabInfo,
    manager_msg::{HostEvent, ManagerMsg},
};
use crate::services::host::BridgeHost;

use super::{CHANNEL_CLOSED, parse_tab_id};

pub const TAB_HELP_MESSAGE: &str = r#"Usage:
  tabtime tab open <tab> [url]
  tabtime tab activate <tab>
  tabtime tab update <tab> [url]
  tabtime tab close <tab>
  tabtime tab sync '<json>'

Notes:
  - These are sent by the browser bridge, one per tab lifecycle event.
  - `sync` takes the full tab list: [{"id": 1, "url": "https://..."}, ...]
  - `update` without a url reports a change that did not navigate.
"#;

/// `tab <sub> ...`
///
/// The host mirror is updated before the daemon hears about the event, so
/// any lookup the daemon makes while handling it sees the new state.
pub async fn handle_tab(args: &str, tx: &mpsc::Sender<ManagerMsg>, host: &BridgeHost) -> String {
    let args = args.trim();
    let (sub, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    let rest = rest.trim();

    let ev = match sub {
        "" | "help" | "-h" | "--help" => return TAB_HELP_MESSAGE.to_string(),

        "open" | "update" => {
            let (id, url) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let tab_id = match parse_tab_id(id) {
                Ok(id) => id,
                Err(e) => return format!("{e}\n\n{TAB_HELP_MESSAGE}"),
            };
            let url = Some(url.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string);

            if sub == "open" {
                host.open(tab_id, url.clone());
                HostEvent::Opened { tab_id, url }
            } else {
                host.update(tab_id, url.clone());
                HostEvent::Updated { tab_id, url }
            }
        }

        "activate" => match parse_tab_id(rest) {
            Ok(tab_id) => {
                // an active tab exists even if we never saw it open
                host.update(tab_id, None);
                HostEvent::Activated { tab_id }
            }
            Err(e) => return format!("{e}\n\n{TAB_HELP_MESSAGE}"),
        },

        "close" => match parse_tab_id(rest) {
            Ok(tab_id) => {
                host.remove(tab_id);
                HostEvent::Removed { tab_id }
            }
            Err(e) => return format!("{e}\n\n{TAB_HELP_MESSAGE}"),
        },

        "sync" => match serde_json::from_str::<Vec<TabInfo>>(rest) {
            Ok(tabs) => {
                if !host.is_synced() {
                    info!(tabs = tabs.len(), "first tab list from the browser bridge");
                }
                host.sync(tabs);
                HostEvent::Synced
            }
            Err(e) => return format!("ERROR: invalid tab list: {e}"),
        },

        other => return format!("ERROR: unknown tab subcommand '{other}'\n\n{TAB_HELP_MESSAGE}"),
    };

    if tx.send(ManagerMsg::Host(ev)).await.is_err() {
        return CHANNEL_CLOSED.to_string();
    }

    "OK".to_string()
}

/// `suspend`: the browser is about to unload the bridge.
pub async fn handle_suspend(tx: &mpsc::Sender<ManagerMsg>) -> String {
    if tx
        .send(ManagerMsg::Host(HostEvent::Suspending))
        .await
        .is_err()
    {
        return CHANNEL_CLOSED.to_string();
    }

    "OK".to_string()
}
