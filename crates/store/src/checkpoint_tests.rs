// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cso_core::{Session, SessionId, TerminalId};
use tempfile::tempdir;

#[test]
fn start_writes_a_durable_snapshot_by_the_time_wait_returns() {
    let dir = tempdir().expect("tempdir");
    let snapshot_path = dir.path().join("snapshot.json");
    let checkpointer = Checkpointer::new(snapshot_path.clone());

    let mut state = MaterializedState::default();
    let session = Session::new(
        SessionId::new("s1"),
        "demo",
        TerminalId::new("t1"),
        std::path::PathBuf::from("/proj"),
        1_000,
    );
    state.sessions.insert(session.id.clone(), session);

    let handle = checkpointer.start(7, &state);
    let result = handle.wait().expect("checkpoint");

    assert_eq!(result.seq, 7);
    assert!(snapshot_path.exists());
    let loaded = Snapshot::load(&snapshot_path).expect("load").expect("present");
    assert_eq!(loaded.seq, 7);
}

#[test]
fn checkpoint_sync_blocks_until_durable() {
    let dir = tempdir().expect("tempdir");
    let snapshot_path = dir.path().join("snapshot.json");
    let checkpointer = Checkpointer::new(snapshot_path.clone());

    let result = checkpointer.checkpoint_sync(1, &MaterializedState::default()).expect("checkpoint");
    assert_eq!(result.seq, 1);
    assert!(snapshot_path.exists());
}
