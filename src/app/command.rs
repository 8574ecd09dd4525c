// Author: Dustin Pilgrim
// License: MIT

use eyre::{Result, eyre};

use crate::cli::Command;

pub async fn run(cmd: Command) -> Result<()> {
    if matches!(cmd, Command::Watch) {
        return crate::ipc::client::watch(|line| println!("{line}"))
            .await
            .map_err(|e| eyre!("tabtime: {e}"));
    }

    let request = cmd.to_request();

    match crate::ipc::client::send_raw(&request).await {
        Ok(resp) => {
            let out = resp.trim_end();
            if out.starts_with("ERROR") {
                eprintln!("{out}");
                std::process::exit(1);
            }
            if !out.is_empty() {
                println!("{out}");
            }
            Ok(())
        }
        Err(e) => Err(eyre!("tabtime: {e}")),
    }
}
