// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::mpsc;

use crate::core::manager_msg::ManagerMsg;

use super::request;

/// `status [--json]`
pub async fn handle_status(args: &str, tx: &mpsc::Sender<ManagerMsg>) -> String {
    let as_json = args.split_whitespace().any(|a| a == "--json");

    let snap = match request(tx, |reply| ManagerMsg::GetStatus { reply }).await {
        Ok(s) => s,
        Err(e) => return e,
    };

    if as_json {
        serde_json::to_string_pretty(&snap)
            .unwrap_or_else(|e| format!("ERROR: failed to encode status: {e}"))
    } else {
        snap.pretty()
    }
}
