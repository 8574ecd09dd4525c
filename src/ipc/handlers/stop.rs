// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::mpsc;

use super::{reply_text, request};
use crate::core::manager_msg::ManagerMsg;

/// Handle `tabtime shutdown`.
///
/// Open windows are flushed and tracking stays enabled on disk, so the
/// next daemon picks up where this one left off.
pub async fn handle_shutdown(tx: &mpsc::Sender<ManagerMsg>) -> String {
    match request(tx, |reply| ManagerMsg::StopDaemon { reply }).await {
        Err(_) => "tabtime daemon not running".to_string(),
        res => {
            let out = reply_text(res);
            if out.trim().is_empty() {
                "Stopping tabtime daemon".to_string()
            } else {
                out.trim_end().to_string()
            }
        }
    }
}
