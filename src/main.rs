// Author: Dustin Pilgrim
// License: MIT

mod app;
mod cli;
mod config;
mod core;
mod daemon;
mod ipc;
mod services;
mod tabtime_log;

use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Args::parse();

    if let Some(cmd) = args.command {
        return app::command::run(cmd).await;
    }

    app::daemon_mode::run(args).await
}
