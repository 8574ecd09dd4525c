// Author: Dustin Pilgrim
// License: MIT

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tabtime",
    version = env!("CARGO_PKG_VERSION"),
    about = "Per-tab web page time tracker"
)]
pub struct Args {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Start tracking time on a tab")]
    Start { tab: u64 },

    #[command(about = "Stop tracking time on a tab")]
    Stop { tab: u64 },

    #[command(about = "Show tracked tabs and pending time")]
    Status {
        #[arg(long)]
        json: bool,
    },

    #[command(about = "Show recorded time for a url")]
    History { url: String },

    #[command(about = "Summarize recorded time per day and per url")]
    Report {
        /// First day, YYYY-MM-DD (UTC). Defaults to today.
        #[arg(long)]
        from: Option<String>,

        /// Day after the last one reported, YYYY-MM-DD (UTC).
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    #[command(about = "Stream live updates as JSON lines")]
    Watch,

    #[command(about = "Report a browser tab event (used by the browser bridge)")]
    Tab {
        #[command(subcommand)]
        event: TabCommand,
    },

    #[command(about = "Flush open windows before the browser bridge unloads")]
    Suspend,

    #[command(about = "Stop the running tabtime daemon")]
    Shutdown,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TabCommand {
    Open { tab: u64, url: Option<String> },
    Activate { tab: u64 },
    Update { tab: u64, url: Option<String> },
    Close { tab: u64 },
    /// Full tab list as JSON: [{"id": 1, "url": "..."}]
    Sync { json: String },
}

impl Command {
    /// The request line sent to the daemon.
    pub fn to_request(&self) -> String {
        match self {
            Command::Start { tab } => format!("start {tab}"),
            Command::Stop { tab } => format!("stop {tab}"),
            Command::Status { json: true } => "status --json".to_string(),
            Command::Status { json: false } => "status".to_string(),
            Command::History { url } => format!("history {url}"),
            Command::Report { from, to } => match (from, to) {
                (Some(f), Some(t)) => format!("report {f} {t}"),
                (Some(f), None) => format!("report {f}"),
                _ => "report".to_string(),
            },
            Command::Watch => "watch".to_string(),
            Command::Tab { event } => match event {
                TabCommand::Open { tab, url } => with_url(format!("tab open {tab}"), url),
                TabCommand::Activate { tab } => format!("tab activate {tab}"),
                TabCommand::Update { tab, url } => with_url(format!("tab update {tab}"), url),
                TabCommand::Close { tab } => format!("tab close {tab}"),
                TabCommand::Sync { json } => format!("tab sync {json}"),
            },
            Command::Suspend => "suspend".to_string(),
            Command::Shutdown => "shutdown".to_string(),
        }
    }
}

fn with_url(mut base: String, url: &Option<String>) -> String {
    if let Some(u) = url {
        base.push(' ');
        base.push_str(u);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(argv: &[&str]) -> String {
        let args = Args::try_parse_from(argv).expect("parse");
        args.command.expect("subcommand").to_request()
    }

    #[test]
    fn builds_request_lines() {
        assert_eq!(request(&["tabtime", "start", "4"]), "start 4");
        assert_eq!(request(&["tabtime", "status", "--json"]), "status --json");
        assert_eq!(
            request(&["tabtime", "report", "--from", "2026-01-01", "--to", "2026-02-01"]),
            "report 2026-01-01 2026-02-01"
        );
        assert_eq!(
            request(&["tabtime", "tab", "open", "3", "https://a.example/"]),
            "tab open 3 https://a.example/"
        );
        assert_eq!(request(&["tabtime", "tab", "update", "3"]), "tab update 3");
    }

    #[test]
    fn no_subcommand_means_daemon_mode() {
        let args = Args::try_parse_from(["tabtime", "--verbose"]).expect("parse");
        assert!(args.command.is_none());
        assert!(args.verbose);
    }

    #[test]
    fn rejects_non_numeric_tab() {
        assert!(Args::try_parse_from(["tabtime", "start", "abc"]).is_err());
    }
}
