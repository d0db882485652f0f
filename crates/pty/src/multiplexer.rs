// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PTY Multiplexer (§4.2): owns every live terminal, fans its raw bytes
//! out to subscribers, and forwards process-exit notice onto the engine bus.

use crate::error::PtyError;
use crate::terminal::TerminalHandle;
use cso_core::{EngineEvent, TerminalId};
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::info;

/// Fan-out multiplexer over raw PTYs, one per `TerminalId`.
///
/// PTY read loops never touch the Store or Session Registry directly (§5);
/// the only thing that crosses out of this crate is bytes (to subscribers)
/// and `EngineEvent::TerminalExited` (to whoever owns the engine bus).
pub struct PtyMultiplexer {
    terminals: DashMap<TerminalId, Arc<TerminalHandle>>,
    exited_tx: mpsc::UnboundedSender<(TerminalId, Option<i32>)>,
}

impl PtyMultiplexer {
    /// `engine_events` receives one `EngineEvent::TerminalExited` per PTY
    /// whose child process exits (or whose reader hit an I/O error).
    pub fn new(engine_events: mpsc::UnboundedSender<EngineEvent>) -> Arc<Self> {
        let (exited_tx, mut exited_rx) = mpsc::unbounded_channel();

        let multiplexer = Arc::new(Self { terminals: DashMap::new(), exited_tx });

        let relay = multiplexer.clone();
        tokio::spawn(async move {
            while let Some((terminal_id, code)) = exited_rx.recv().await {
                info!(%terminal_id, code, "terminal exited");
                relay.terminals.remove(&terminal_id);
                let _ = engine_events.send(EngineEvent::TerminalExited { terminal_id, code });
            }
        });

        multiplexer
    }

    /// Idempotent on `id` (§4.2): an existing terminal is returned as-is,
    /// without spawning a second child under the same id.
    pub fn create(
        &self,
        id: TerminalId,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
        rows: u16,
        cols: u16,
    ) -> Result<(), PtyError> {
        if self.terminals.contains_key(&id) {
            return Ok(());
        }

        let handle = TerminalHandle::spawn(id.clone(), cwd, cmd, env, rows, cols, self.exited_tx.clone())?;
        self.terminals.insert(id, handle);
        Ok(())
    }

    fn get(&self, id: &TerminalId) -> Result<Arc<TerminalHandle>, PtyError> {
        self.terminals.get(id).map(|entry| entry.value().clone()).ok_or_else(|| PtyError::NotFound(id.to_string()))
    }

    /// Writes are literal — the caller composes keystrokes (e.g. appends
    /// `b"\r"` for Enter) before calling this.
    pub fn write(&self, id: &TerminalId, data: &[u8]) -> Result<(), PtyError> {
        self.get(id)?.write(data)
    }

    pub fn resize(&self, id: &TerminalId, rows: u16, cols: u16) -> Result<(), PtyError> {
        self.get(id)?.resize(rows, cols)
    }

    /// Killing an already-dead or unknown terminal is not an error (§4.2:
    /// "not-found-not-error" is part of the contract shape this mirrors).
    /// Removes the entry immediately so a `create` for the same id right
    /// after spawns fresh rather than racing the reader thread's own exit
    /// notice.
    pub fn kill(&self, id: &TerminalId) -> Result<(), PtyError> {
        if let Some((_, entry)) = self.terminals.remove(id) {
            entry.kill()?;
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<TerminalId> {
        self.terminals.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_alive(&self, id: &TerminalId) -> bool {
        self.terminals.get(id).map(|entry| entry.is_alive()).unwrap_or(false)
    }

    pub fn subscribe(&self, id: &TerminalId) -> Result<(u64, mpsc::Receiver<Vec<u8>>), PtyError> {
        Ok(self.get(id)?.subscribe())
    }

    pub fn unsubscribe(&self, id: &TerminalId, subscriber_id: u64) {
        if let Some(entry) = self.terminals.get(id) {
            entry.unsubscribe(subscriber_id);
        }
    }

    /// Drop the multiplexer's record of a terminal once its Session has been
    /// torn down. Does not kill the process — callers must `kill` first.
    pub fn forget(&self, id: &TerminalId) {
        self.terminals.remove(id);
    }

    /// Whether any process matching `pattern` is running under the PTY's
    /// child (§4.6 uses this to decide whether the AI CLI has finished or is
    /// still spawning tool subprocesses). Runs `ps`/`pgrep` against the PTY's
    /// own child pid, the raw-PTY analogue of the tmux adapter's pane-pid
    /// check.
    pub async fn has_active_descendants(&self, id: &TerminalId, pattern: &str) -> Result<bool, PtyError> {
        let handle = self.get(id)?;
        let Some(pid) = handle.process_id() else {
            return Ok(false);
        };
        let pid = pid.to_string();

        let (ps_output, pgrep_output) = tokio::try_join!(
            async {
                Command::new("ps")
                    .args(["-p", &pid, "-o", "command="])
                    .output()
                    .await
                    .map_err(|e| PtyError::CommandFailed(e.to_string()))
            },
            async {
                Command::new("pgrep")
                    .args(["-P", &pid, "-f", pattern])
                    .output()
                    .await
                    .map_err(|e| PtyError::CommandFailed(e.to_string()))
            },
        )?;

        if ps_output.status.success() && String::from_utf8_lossy(&ps_output.stdout).contains(pattern) {
            return Ok(true);
        }

        Ok(pgrep_output.status.success())
    }
}

#[cfg(test)]
#[path = "multiplexer_tests.rs"]
mod tests;
