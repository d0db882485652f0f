// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrates discovery and tailing of every per-session log file under a
//! watch root, combining a `notify` recursive watch with a fallback poll
//! loop exactly like the teacher's `start_watcher`/`watch_agent`/`watch_loop`
//! — except this watcher owns a whole directory of streams rather than one
//! known session log.

use crate::discover::{cli_session_id_from_path, discover_logs};
use crate::stream::LogStream;
use cso_core::WatchEvent;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Fallback poll interval when filesystem notifications are unavailable or
/// silent (default: 2000ms, overridable via `CSO_WATCHER_POLL_MS`).
pub fn watcher_poll_ms() -> Duration {
    parse_duration_ms("CSO_WATCHER_POLL_MS").unwrap_or(Duration::from_millis(2000))
}

/// Start watching `root` for per-session log files. Returns a shutdown
/// sender; dropping or firing it stops the watch loop.
pub fn start_watcher(root: PathBuf, event_tx: mpsc::Sender<WatchEvent>) -> oneshot::Sender<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(watch_loop(root, event_tx, shutdown_rx));
    shutdown_tx
}

fn create_file_watcher(
    root: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> Result<RecommendedWatcher, notify::Error> {
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            for path in event.paths {
                let _ = tx.blocking_send(path);
            }
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

async fn watch_loop(root: PathBuf, event_tx: mpsc::Sender<WatchEvent>, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut streams: HashMap<PathBuf, LogStream> = HashMap::new();

    for log in discover_logs(&root) {
        let offset = eof_offset(&log.path);
        streams.insert(log.path.clone(), LogStream::new(log.cli_session_id, log.path, offset));
    }

    let (notify_tx, mut notify_rx) = mpsc::channel(256);
    let _watcher_guard = match create_file_watcher(&root, notify_tx) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, root = %root.display(), "file watcher failed, using fallback polling only");
            None
        }
    };

    poll_all(&mut streams, &event_tx).await;

    loop {
        tokio::select! {
            Some(path) = notify_rx.recv() => {
                if path.extension().is_none_or(|ext| ext != "jsonl") {
                    continue;
                }
                if !streams.contains_key(&path) {
                    if path.exists() {
                        if let Some(cli_session_id) = cli_session_id_from_path(&path) {
                            tracing::info!(path = %path.display(), "new session log discovered");
                            streams.insert(path.clone(), LogStream::new(cli_session_id, path.clone(), 0));
                        }
                    } else {
                        continue;
                    }
                }
                if let Some(stream) = streams.get_mut(&path) {
                    if !path.exists() {
                        tracing::debug!(path = %path.display(), "session log removed, closing stream");
                        streams.remove(&path);
                        continue;
                    }
                    dispatch(stream, &event_tx).await;
                }
            }

            _ = tokio::time::sleep(watcher_poll_ms()) => {
                for log in discover_logs(&root) {
                    if !streams.contains_key(&log.path) {
                        let offset = eof_offset(&log.path);
                        streams.insert(log.path.clone(), LogStream::new(log.cli_session_id, log.path, offset));
                    }
                }
                poll_all(&mut streams, &event_tx).await;
            }

            _ = &mut shutdown_rx => {
                tracing::debug!(root = %root.display(), "log watcher shutdown requested");
                break;
            }
        }
    }
}

/// Start-up streams begin at end-of-file (§4.3: "start at end-of-file for
/// efficiency... backfill on demand"); a file that can't be stat'd starts at 0.
fn eof_offset(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

async fn poll_all(streams: &mut HashMap<PathBuf, LogStream>, event_tx: &mpsc::Sender<WatchEvent>) {
    for stream in streams.values_mut() {
        dispatch(stream, event_tx).await;
    }
}

async fn dispatch(stream: &mut LogStream, event_tx: &mpsc::Sender<WatchEvent>) {
    for event in stream.poll() {
        if event_tx.send(event).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
