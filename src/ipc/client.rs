// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    time::{Duration, timeout},
};

use super::REQUEST_TIMEOUT;

pub async fn send_raw(cmd: &str) -> Result<String, String> {
    let path = crate::ipc::socket_path()?;
    send_raw_to(&path, cmd).await
}

async fn connect_and_send(path: &Path, cmd: &str) -> Result<UnixStream, String> {
    if !path.exists() {
        return Err("daemon not running".to_string());
    }

    let mut stream = match timeout(Duration::from_secs(2), UnixStream::connect(path)).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => return Err(format!("failed to connect to {}: {e}", path.display())),
        Err(_) => return Err("timeout connecting to daemon".to_string()),
    };

    timeout(Duration::from_secs(2), stream.write_all(cmd.as_bytes()))
        .await
        .map_err(|_| "timeout writing to daemon".to_string())?
        .map_err(|e| format!("write failed: {e}"))?;

    timeout(Duration::from_secs(2), stream.shutdown())
        .await
        .map_err(|_| "timeout finalizing request".to_string())?
        .map_err(|e| format!("shutdown failed: {e}"))?;

    Ok(stream)
}

pub async fn send_raw_to(path: &Path, cmd: &str) -> Result<String, String> {
    let mut stream = connect_and_send(path, cmd).await?;

    let mut resp = Vec::new();
    timeout(REQUEST_TIMEOUT, stream.read_to_end(&mut resp))
        .await
        .map_err(|_| "timeout reading response".to_string())?
        .map_err(|e| format!("read failed: {e}"))?;

    Ok(String::from_utf8_lossy(&resp).to_string())
}

/// Attach as a viewer and hand each update line to `on_line` until the
/// daemon closes the stream.
pub async fn watch(mut on_line: impl FnMut(&str)) -> Result<(), String> {
    let path = crate::ipc::socket_path()?;
    let stream = connect_and_send(&path, "watch").await?;

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("read failed: {e}"))?
    {
        if line.starts_with("ERROR") {
            return Err(line);
        }
        // keepalive
        if line.is_empty() {
            continue;
        }
        on_line(&line);
    }

    Ok(())
}
