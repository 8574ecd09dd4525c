// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::{broadcast, mpsc};

use crate::core::{action::LiveUpdate, manager_msg::ManagerMsg};
use crate::services::host::BridgeHost;

use super::handlers::{history, request, status, stop, tabs, tracking};

pub const HELP_MESSAGE: &str = r#"Commands:
  start <tab>            begin tracking a tab
  stop <tab>             stop tracking a tab
  tab <sub> ...          browser bridge events (see `tab help`)
  suspend                flush open windows before the bridge unloads
  status [--json]        tracked tabs and pending time
  history <url>          recorded time for one url
  report [<from> <to>]   totals per day and url
  watch                  stream live updates as JSON lines
  shutdown               stop the daemon
"#;

pub enum Response {
    Text(String),
    /// Keep the connection open and stream updates.
    Watch(broadcast::Receiver<LiveUpdate>),
}

fn split_command(cmd: &str) -> (&str, &str) {
    let cmd = cmd.trim();
    match cmd.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (cmd, ""),
    }
}

/// Routes one request line to its handler.
pub async fn route_command(cmd: &str, tx: &mpsc::Sender<ManagerMsg>, host: &BridgeHost) -> Response {
    let (head, args) = split_command(cmd);

    let text = match head {
        "start" => tracking::handle_start(args, tx).await,
        "stop" => tracking::handle_stop(args, tx).await,

        "tab" => tabs::handle_tab(args, tx, host).await,
        "suspend" => tabs::handle_suspend(tx).await,

        "status" => status::handle_status(args, tx).await,
        "history" => history::handle_history(args, tx).await,
        "report" => history::handle_report(args, tx).await,

        "watch" => {
            return match request(tx, |reply| ManagerMsg::Subscribe { reply }).await {
                Ok(rx) => Response::Watch(rx),
                Err(e) => Response::Text(e),
            };
        }

        "shutdown" => stop::handle_shutdown(tx).await,

        "" | "help" | "-h" | "--help" => HELP_MESSAGE.to_string(),

        other => format!("ERROR: unknown command '{other}'\n\n{HELP_MESSAGE}"),
    };

    Response::Text(text)
}
