// Author: Dustin Pilgrim
// License: MIT

use eyre::{Result, WrapErr, eyre};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::cli::Args;
use crate::core::{manager::Manager, manager_msg::ManagerMsg};
use crate::daemon::Daemon;
use crate::services::{
    host::BridgeHost, records::JsonlRecordStore, storage::JsonFileStore, ticker::TickerSet,
    viewer::LiveUpdates,
};

pub async fn run(args: Args) -> Result<()> {
    // single-instance
    let _instance_lock = crate::app::platform::acquire_single_instance_lock().map_err(|e| eyre!(e))?;

    // logging
    let log_path = crate::tabtime_log::default_log_path();
    let _log_guard = crate::tabtime_log::init(args.verbose, log_path.as_deref());
    if let Some(p) = &log_path {
        info!(path = %p.display(), "file logging enabled");
    }

    info!("tabtime starting");

    let cfg = crate::config::load(args.config.as_deref());
    info!(
        tick_interval_ms = cfg.tick_interval_ms,
        flush_period_seconds = cfg.flush_period_seconds,
        "configuration"
    );

    let records = JsonlRecordStore::open(cfg.records_path())
        .await
        .wrap_err("failed to open record store")?;
    let storage = JsonFileStore::new(cfg.state_path());
    info!(
        records = %records.path().display(),
        state = %storage.path().display(),
        "storage ready"
    );
    let host = BridgeHost::new();
    let live = LiveUpdates::new(cfg.live_buffer);

    let (tx, rx) = mpsc::channel::<ManagerMsg>(256);
    let tickers = TickerSet::new(tx.clone(), cfg.tick_interval());

    // ipc
    let socket_path = crate::ipc::socket_path().map_err(|e| eyre!(e))?;
    let listener = crate::ipc::server::bind_socket(&socket_path)
        .wrap_err_with(|| format!("failed to bind ipc socket {}", socket_path.display()))?;
    let server = crate::ipc::server::spawn_ipc_server(listener, tx, host.clone());
    info!(socket = %socket_path.display(), "ipc listening");

    // shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut daemon = Daemon::new(
        Manager::new(cfg.flush_period_ms()),
        host,
        records,
        storage,
        tickers,
        live,
    );

    daemon.run(rx, shutdown_rx).await;

    server.abort();
    if let Err(e) = std::fs::remove_file(&socket_path) {
        warn!(error = %e, "failed to remove ipc socket");
    }

    Ok(())
}

async fn wait_for_signal() {
    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, only Ctrl+C stops the daemon");
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, shutting down");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received Ctrl+C, shutting down"),
        _ = term.recv() => info!("received SIGTERM, shutting down"),
    }
}
