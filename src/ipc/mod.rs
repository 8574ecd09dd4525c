// Author: Dustin Pilgrim
// License: MIT

pub mod client;
pub mod handlers;
pub mod router;
pub mod server;

use std::path::PathBuf;

use tokio::time::Duration;

/// Largest request the server reads.
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// Per-connection budget for everything but `watch`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Quiet `watch` streams get a blank line this often, so a viewer that
/// went away is noticed even while nothing is tracked.
pub const WATCH_KEEPALIVE: Duration = Duration::from_secs(15);

pub fn runtime_dir() -> Result<PathBuf, String> {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| "XDG_RUNTIME_DIR is not set".to_string())
}

pub fn socket_path() -> Result<PathBuf, String> {
    Ok(runtime_dir()?.join("tabtime").join("tabtime.sock"))
}
