//! `inkframe status` / `inkframe stop` — control-socket client commands.

use anyhow::{Context, Result};
use colored::Colorize;

use inkframe_daemon::paths::socket_path;
use inkframe_daemon::{request_status, request_stop, DaemonError};

pub fn status() -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;

    match request_status(&home) {
        Ok(status) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&status)
                    .context("failed to render daemon status JSON")?
            );
        }
        Err(DaemonError::DaemonNotRunning { .. }) => {
            let payload = serde_json::json!({
                "running": false,
                "socket": socket_path(&home).display().to_string(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to render daemon status JSON")?
            );
        }
        Err(err) => return Err(err).context("failed to query daemon status"),
    }

    Ok(())
}

pub fn stop() -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;

    match request_stop(&home) {
        Ok(()) => println!("{}", "daemon stop requested".green()),
        Err(DaemonError::DaemonNotRunning { .. }) => {
            println!("{}", "daemon is not running".yellow());
        }
        Err(err) => return Err(err).context("failed to stop daemon"),
    }

    Ok(())
}
