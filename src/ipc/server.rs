// Author: Dustin Pilgrim
// License: MIT

use std::io;
use std::path::Path;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
    time::{Duration, Instant, MissedTickBehavior, interval_at, timeout},
};
use tracing::{debug, error, warn};

use super::{
    MAX_REQUEST_BYTES, REQUEST_TIMEOUT, WATCH_KEEPALIVE,
    router::{Response, route_command},
};
use crate::core::{action::LiveUpdate, manager_msg::ManagerMsg};
use crate::services::host::BridgeHost;

/// Bind the command socket, replacing a stale one.
///
/// Only call this while holding the single-instance lock.
pub fn bind_socket(path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale ipc socket"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    UnixListener::bind(path)
}

/// Accept connections forever, one request per connection.
pub fn spawn_ipc_server(
    listener: UnixListener,
    tx: mpsc::Sender<ManagerMsg>,
    host: BridgeHost,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = tx.clone();
                    let host = host.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, tx, host).await {
                            warn!(error = %e, "ipc connection failed");
                        }
                    });
                }
                Err(e) => error!(error = %e, "failed to accept ipc connection"),
            }
        }
    })
}

async fn handle_connection(
    mut stream: UnixStream,
    tx: mpsc::Sender<ManagerMsg>,
    host: BridgeHost,
) -> io::Result<()> {
    let routed = timeout(REQUEST_TIMEOUT, read_and_route(&mut stream, &tx, &host)).await;

    let response = match routed {
        Ok(r) => r?,
        Err(_) => {
            warn!("ipc request timed out after {}s", REQUEST_TIMEOUT.as_secs());
            return Ok(());
        }
    };

    match response {
        Response::Text(text) => {
            timeout(REQUEST_TIMEOUT, async {
                stream.write_all(text.as_bytes()).await?;
                stream.flush().await
            })
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "ipc reply timed out"))??;
        }
        Response::Watch(rx) => {
            debug!("viewer attached");
            stream_updates(&mut stream, rx, WATCH_KEEPALIVE).await?;
            debug!("viewer detached");
        }
    }

    let _ = stream.shutdown().await;
    Ok(())
}

async fn read_and_route(
    stream: &mut UnixStream,
    tx: &mpsc::Sender<ManagerMsg>,
    host: &BridgeHost,
) -> io::Result<Response> {
    let Some(cmd) = read_request(stream).await? else {
        return Ok(Response::Text(format!(
            "ERROR: request larger than {MAX_REQUEST_BYTES} bytes"
        )));
    };

    if cmd.is_empty() {
        return Ok(Response::Text(String::new()));
    }

    // sync payloads can be long
    let head: String = cmd.chars().take(80).collect();
    debug!(cmd = %head, "ipc command");

    Ok(route_command(&cmd, tx, host).await)
}

/// Read until the client half-closes. `None` if the request is too large.
async fn read_request(stream: &mut UnixStream) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    (&mut *stream)
        .take(MAX_REQUEST_BYTES + 1)
        .read_to_end(&mut buf)
        .await?;

    if buf.len() as u64 > MAX_REQUEST_BYTES {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
}

/// One JSON object per line until the viewer goes away.
///
/// The viewer has half-closed its side, so only a failed write tells us
/// it is gone. Idle streams get a blank keepalive line to force one.
async fn stream_updates(
    stream: &mut UnixStream,
    mut rx: broadcast::Receiver<LiveUpdate>,
    keepalive: Duration,
) -> io::Result<()> {
    let mut idle = interval_at(Instant::now() + keepalive, keepalive);
    idle.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let line = tokio::select! {
            recv = rx.recv() => match recv {
                Ok(update) => {
                    idle.reset();
                    let mut line = serde_json::to_string(&update).map_err(io::Error::other)?;
                    line.push('\n');
                    line
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "viewer lagging, updates dropped");
                    continue;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            _ = idle.tick() => "\n".to_string(),
        };

        if let Err(e) = stream.write_all(line.as_bytes()).await {
            return match e.kind() {
                io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => Ok(()),
                _ => Err(e),
            };
        }
    }
}
