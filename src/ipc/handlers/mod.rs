// Author: Dustin Pilgrim
// License: MIT

pub mod history;
pub mod status;
pub mod stop;
pub mod tabs;
pub mod tracking;

use tokio::sync::{mpsc, oneshot};

use crate::core::{manager_msg::ManagerMsg, state::TabId};

pub const CHANNEL_CLOSED: &str = "ERROR: daemon event channel closed";

pub fn parse_tab_id(s: &str) -> Result<TabId, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("ERROR: missing tab id".to_string());
    }
    s.parse::<TabId>()
        .map_err(|_| format!("ERROR: invalid tab id '{s}'"))
}

/// Send a request carrying a reply channel and wait for the answer.
pub async fn request<T>(
    tx: &mpsc::Sender<ManagerMsg>,
    build: impl FnOnce(oneshot::Sender<T>) -> ManagerMsg,
) -> Result<T, String> {
    let (reply_tx, reply_rx) = oneshot::channel();

    if tx.send(build(reply_tx)).await.is_err() {
        return Err(CHANNEL_CLOSED.to_string());
    }

    reply_rx
        .await
        .map_err(|_| "ERROR: no response from daemon".to_string())
}

/// Flatten a daemon `Result<String, String>` reply into response text.
pub fn reply_text(res: Result<Result<String, String>, String>) -> String {
    match res {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => format!("ERROR: {e}"),
        Err(e) => e,
    }
}
