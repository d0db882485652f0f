// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public Store API (§4.1): durable sessions, correlation rows, the
//! active-session pointer, and the execution-mapping table, all behind one
//! `parking_lot::Mutex` guarding the `MaterializedState`.
//!
//! Every mutating call appends a [`StoreEvent`] to the WAL before applying it
//! in-memory — the WAL append is the durability point, the in-memory apply is
//! what readers see. Background [`checkpoint`](Store::checkpoint) snapshots
//! the state and truncates the WAL so it never grows unbounded.

use crate::checkpoint::Checkpointer;
use crate::event::{ExecutionMappingEntry, SessionPatch, StoreEvent};
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use crate::StoreError;
use cso_core::{CliSessionId, MessageId, Session, SessionId, TerminalId};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A durable, single-writer store of sessions and correlation state.
///
/// Cloning is cheap (`Arc`-backed internals would be the natural next step
/// if this needed to be shared across tasks without a wrapping `Arc` at the
/// call site; today callers hold it behind their own `Arc<Store>`).
pub struct Store {
    inner: Mutex<Inner>,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    checkpointer: Checkpointer,
}

impl Store {
    /// Open (or create) a Store rooted at `dir`, replaying `wal.jsonl` from
    /// `snapshot.json` if present.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let snapshot_path = dir.join("snapshot.json");
        let wal_path = dir.join("wal.jsonl");

        let (mut state, processed_seq) = match Snapshot::load(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        if replayed > 0 {
            info!(replayed, "replayed WAL entries on Store open");
        }

        let checkpointer = Checkpointer::new(snapshot_path);

        Ok(Self { inner: Mutex::new(Inner { wal, state, checkpointer }) })
    }

    fn commit(&self, inner: &mut Inner, event: StoreEvent) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(())
    }

    pub fn get_session(&self, id: &SessionId) -> Option<Session> {
        self.inner.lock().state.sessions.get(id).cloned()
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        self.inner.lock().state.sessions.values().cloned().collect()
    }

    pub fn upsert_session(&self, session: Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::UpsertSession(session))
    }

    pub fn patch_session(&self, id: &SessionId, patch: SessionPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.sessions.contains_key(id) {
            return Err(StoreError::SessionNotFound(id.to_string()));
        }
        self.commit(&mut inner, StoreEvent::PatchSession { id: id.clone(), patch })
    }

    /// Idempotent: deleting an already-absent session is not an error.
    pub fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::DeleteSession { id: id.clone() })
    }

    pub fn set_active_session(&self, id: Option<SessionId>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::SetActiveSession { id })
    }

    pub fn get_active_session(&self) -> Option<SessionId> {
        self.inner.lock().state.active_session.clone()
    }

    /// Atomically upserts both the `sessionId → messageId` and
    /// `messageId → sessionId` directions (the Correlator's join key).
    pub fn put_correlation(&self, session_id: &SessionId, message_id: &MessageId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::PutCorrelation { session_id: session_id.clone(), message_id: message_id.clone() },
        )
    }

    /// O(1) expected: the hot path the Correlator calls per incoming log line.
    pub fn lookup_session_by_message_id(&self, message_id: &MessageId) -> Option<SessionId> {
        self.inner.lock().state.session_by_message_id.get(message_id).cloned()
    }

    pub fn lookup_session_by_cli_session_id(&self, cli_session_id: &CliSessionId) -> Option<SessionId> {
        self.inner.lock().state.session_by_cli_session_id.get(cli_session_id).cloned()
    }

    pub fn remove_correlation(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::RemoveCorrelation { session_id: session_id.clone() })
    }

    pub fn put_execution_mapping(
        &self,
        cli_session_id: &CliSessionId,
        session_id: &SessionId,
        terminal_id: &TerminalId,
        start_time_epoch_ms: u64,
    ) -> Result<(), StoreError> {
        let entry = ExecutionMappingEntry {
            session_id: session_id.clone(),
            terminal_id: terminal_id.clone(),
            start_time_epoch_ms,
        };
        let mut inner = self.inner.lock();
        self.commit(
            &mut inner,
            StoreEvent::PutExecutionMapping { cli_session_id: cli_session_id.clone(), entry },
        )
    }

    pub fn take_execution_mapping(&self, cli_session_id: &CliSessionId) -> Result<Option<ExecutionMappingEntry>, StoreError> {
        let mut inner = self.inner.lock();
        let entry = inner.state.execution_mapping.get(cli_session_id).cloned();
        if entry.is_some() {
            self.commit(&mut inner, StoreEvent::TakeExecutionMapping { cli_session_id: cli_session_id.clone() })?;
        }
        Ok(entry)
    }

    pub fn set_pending_execution(
        &self,
        session_id: &SessionId,
        terminal_id: &TerminalId,
        start_time_epoch_ms: u64,
    ) -> Result<(), StoreError> {
        let entry = ExecutionMappingEntry {
            session_id: session_id.clone(),
            terminal_id: terminal_id.clone(),
            start_time_epoch_ms,
        };
        let mut inner = self.inner.lock();
        self.commit(&mut inner, StoreEvent::SetPendingExecution { entry: Some(entry) })
    }

    pub fn take_pending_execution(&self) -> Result<Option<ExecutionMappingEntry>, StoreError> {
        let mut inner = self.inner.lock();
        let entry = inner.state.pending_execution.clone();
        if entry.is_some() {
            self.commit(&mut inner, StoreEvent::TakePendingExecution)?;
        }
        Ok(entry)
    }

    /// Flush any buffered WAL writes without waiting for group-commit timeout.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.inner.lock().wal.flush()
    }

    /// Snapshot current state and truncate the WAL up to the checkpointed
    /// sequence. Safe to call concurrently with mutations; the snapshot
    /// reflects whatever committed before the lock was taken.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let (seq, state, checkpointer) = {
            let mut inner = self.inner.lock();
            inner.wal.flush()?;
            (inner.wal.processed_seq(), inner.state.clone(), inner.checkpointer.clone())
        };
        let handle = checkpointer.start(seq, &state);
        let result = handle.wait()?;
        debug!(seq = result.seq, "checkpoint complete");

        let mut inner = self.inner.lock();
        inner.wal.truncate_before(result.seq.saturating_add(1))?;
        Ok(())
    }

    /// Mirror the execution-mapping table to the on-disk JSON shape for
    /// `cso session debug-dump` (§6) — a read-only view, not a second write
    /// path; the Store above is the only source of truth.
    pub fn execution_mapping_debug_view(&self) -> serde_json::Value {
        let inner = self.inner.lock();
        serde_json::json!({
            "pendingExecution": inner.state.pending_execution,
            "executionMapping": inner.state.execution_mapping,
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
