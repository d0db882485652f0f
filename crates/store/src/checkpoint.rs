// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background checkpointing.
//!
//! The key invariant: the snapshot must be durable on disk before the WAL is
//! truncated. `Checkpointer::start` clones the state (cheap, a handful of
//! sessions) and does the serialize/write/fsync/rename off the main thread;
//! `CheckpointHandle::wait` is the durability barrier the caller must cross
//! before calling `Wal::truncate_before`.

use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::StoreError;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub seq: u64,
}

pub struct CheckpointHandle {
    pub seq: u64,
    receiver: mpsc::Receiver<Result<CheckpointResult, StoreError>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl CheckpointHandle {
    /// Block until the checkpoint is fully durable on disk.
    pub fn wait(self) -> Result<CheckpointResult, StoreError> {
        self.receiver
            .recv()
            .map_err(|_| StoreError::Corrupt { offset: 0, message: "checkpoint thread panicked".into() })?
    }

    pub fn try_wait(&self) -> Option<Result<CheckpointResult, StoreError>> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Clone)]
pub struct Checkpointer {
    snapshot_path: PathBuf,
}

impl Checkpointer {
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self { snapshot_path }
    }

    /// Start a background checkpoint of `state` at WAL sequence `seq`.
    pub fn start(&self, seq: u64, state: &MaterializedState) -> CheckpointHandle {
        let state_clone = state.clone();
        let snapshot_path = self.snapshot_path.clone();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = checkpoint_blocking(seq, &state_clone, &snapshot_path);
            let _ = tx.send(result);
        });

        CheckpointHandle { seq, receiver: rx, handle }
    }

    /// Synchronous checkpoint, used at clean shutdown.
    pub fn checkpoint_sync(&self, seq: u64, state: &MaterializedState) -> Result<CheckpointResult, StoreError> {
        checkpoint_blocking(seq, state, &self.snapshot_path)
    }
}

fn checkpoint_blocking(seq: u64, state: &MaterializedState, snapshot_path: &std::path::Path) -> Result<CheckpointResult, StoreError> {
    let snapshot = Snapshot::new(seq, state.clone());
    snapshot.save(snapshot_path)?;
    Ok(CheckpointResult { seq })
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
