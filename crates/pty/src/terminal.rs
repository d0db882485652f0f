// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One raw PTY and its subscriber fan-out.
//!
//! Unlike a tmux-backed adapter (spawn/send/capture via subprocess calls),
//! this owns the master/slave pair directly: one blocking reader thread per
//! terminal pushes bytes to every subscriber's channel as they arrive,
//! instead of the caller polling `capture-pane`.

use crate::error::PtyError;
use cso_core::TerminalId;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Bound on each subscriber's output queue. A slow subscriber drops frames
/// rather than stalling the PTY reader thread for every other subscriber.
const SUBSCRIBER_QUEUE_DEPTH: usize = 256;

/// A live PTY: raw master handle, a writer, the child, and a set of
/// subscribers fed by one background reader thread.
pub struct TerminalHandle {
    pub id: TerminalId,
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    child: Mutex<Box<dyn Child + Send>>,
    subscribers: dashmap::DashMap<u64, mpsc::Sender<Vec<u8>>>,
    next_subscriber_id: AtomicU64,
}

impl TerminalHandle {
    /// Spawn `cmd` in a freshly opened PTY of `rows`x`cols`, starting the
    /// background reader thread that fans bytes out to subscribers.
    pub fn spawn(
        id: TerminalId,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
        rows: u16,
        cols: u16,
        exited_tx: mpsc::UnboundedSender<(TerminalId, Option<i32>)>,
    ) -> Result<std::sync::Arc<Self>, PtyError> {
        if !cwd.exists() {
            return Err(PtyError::SpawnFailed(format!("working directory does not exist: {}", cwd.display())));
        }

        let pty_system = native_pty_system();
        let size = PtySize { rows, cols, pixel_width: 0, pixel_height: 0 };
        let pair = pty_system
            .openpty(size)
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        let mut builder = CommandBuilder::new("/bin/sh");
        builder.arg("-c");
        builder.arg(cmd);
        builder.cwd(cwd);
        for (key, value) in env {
            builder.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        let handle = std::sync::Arc::new(Self {
            id: id.clone(),
            master: Mutex::new(pair.master),
            writer: Mutex::new(writer),
            child: Mutex::new(child),
            subscribers: dashmap::DashMap::new(),
            next_subscriber_id: AtomicU64::new(1),
        });

        spawn_reader_thread(handle.clone(), reader, exited_tx);

        Ok(handle)
    }

    /// Write bytes verbatim (no key-name interpretation; callers wanting
    /// Enter send `b"\r"` themselves — there is no tmux `send-keys Enter`
    /// step to ride on here).
    pub fn write(&self, data: &[u8]) -> Result<(), PtyError> {
        let mut writer = self.writer.lock();
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    pub fn resize(&self, rows: u16, cols: u16) -> Result<(), PtyError> {
        let size = PtySize { rows, cols, pixel_width: 0, pixel_height: 0 };
        self.master
            .lock()
            .resize(size)
            .map_err(|e| PtyError::CommandFailed(e.to_string()))
    }

    pub fn kill(&self) -> Result<(), PtyError> {
        let mut child = self.child.lock();
        match child.kill() {
            Ok(()) => Ok(()),
            // Already exited is not an error — mirrors the tmux adapter's
            // "session might already be dead, which is fine".
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(PtyError::CommandFailed(e.to_string())),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.child.lock().try_wait().ok().flatten().is_none()
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.lock().process_id()
    }

    /// Register a subscriber; bytes read after this call are queued to it.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<Vec<u8>>) {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        self.subscribers.insert(subscriber_id, tx);
        (subscriber_id, rx)
    }

    pub fn unsubscribe(&self, subscriber_id: u64) {
        self.subscribers.remove(&subscriber_id);
    }

    fn fan_out(&self, bytes: &[u8]) {
        self.subscribers.retain(|_, tx| match tx.try_send(bytes.to_vec()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(terminal_id = %self.id, "subscriber queue full, dropping frame");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

fn spawn_reader_thread(
    handle: std::sync::Arc<TerminalHandle>,
    mut reader: Box<dyn Read + Send>,
    exited_tx: mpsc::UnboundedSender<(TerminalId, Option<i32>)>,
) {
    std::thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => handle.fan_out(&buffer[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(terminal_id = %handle.id, error = %e, "PTY reader error, treating as exit");
                    break;
                }
            }
        }

        let code = handle.child.lock().try_wait().ok().flatten().map(|status| status.exit_code() as i32);
        debug!(terminal_id = %handle.id, code, "PTY reader observed child exit");
        let _ = exited_tx.send((handle.id.clone(), code));
    });
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
