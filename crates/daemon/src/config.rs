// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, resolved from the environment (§6):
//! `CSO_STATE_DIR`, `CSO_LOG_ROOT`, `CSO_GATEWAY_ADDR`. `RUST_LOG` is read
//! directly by `tracing_subscriber::EnvFilter` and has no field here.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Default address the browser-facing WebSocket gateway binds to.
const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:7337";

#[derive(Debug, Clone)]
pub struct Config {
    /// Root for all daemon-owned state: the WAL/snapshot directory, the
    /// control socket, and the lock/PID file.
    pub state_dir: PathBuf,
    /// Root the Log Watcher tails for per-session Claude Code logs.
    pub log_root: PathBuf,
    /// Address the WebSocket gateway binds to.
    pub gateway_addr: String,
    pub control_socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        let log_root = std::env::var("CSO_LOG_ROOT").map(PathBuf::from).unwrap_or_else(|_| default_log_root());
        let gateway_addr = std::env::var("CSO_GATEWAY_ADDR").unwrap_or_else(|_| DEFAULT_GATEWAY_ADDR.to_string());

        Ok(Self {
            control_socket_path: state_dir.join("control.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
            log_root,
            gateway_addr,
        })
    }
}

/// `CSO_STATE_DIR` > `$HOME/.local/state/cso`.
fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CSO_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/cso"))
}

/// Default log root: wherever Claude Code itself writes session transcripts.
fn default_log_root() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".claude/projects")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
