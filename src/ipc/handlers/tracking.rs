// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::mpsc;

use crate::core::manager_msg::ManagerMsg;

use super::{parse_tab_id, reply_text, request};

/// `start <tab>`
pub async fn handle_start(args: &str, tx: &mpsc::Sender<ManagerMsg>) -> String {
    let tab_id = match parse_tab_id(args) {
        Ok(id) => id,
        Err(e) => return format!("{e}\n\nUsage: tabtime start <tab>"),
    };

    reply_text(request(tx, |reply| ManagerMsg::StartTracking { tab_id, reply }).await)
}

/// `stop <tab>`
pub async fn handle_stop(args: &str, tx: &mpsc::Sender<ManagerMsg>) -> String {
    let tab_id = match parse_tab_id(args) {
        Ok(id) => id,
        Err(e) => return format!("{e}\n\nUsage: tabtime stop <tab>"),
    };

    reply_text(request(tx, |reply| ManagerMsg::StopTracking { tab_id, reply }).await)
}
