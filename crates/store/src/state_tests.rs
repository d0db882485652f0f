// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cso_core::{CliSessionId, MessageId, Session, SessionId, TerminalId};

fn sample_session() -> Session {
    Session::new(
        SessionId::new("s1"),
        "demo",
        TerminalId::new("t1"),
        std::path::PathBuf::from("/proj"),
        1_000,
    )
}

#[test]
fn upsert_indexes_cli_session_id_and_message_id() {
    let mut state = MaterializedState::default();
    let mut session = sample_session();
    session.cli_session_id = Some(CliSessionId::new("cli-1"));
    session.last_message_id = Some(MessageId::new("m1"));

    state.apply_event(&StoreEvent::UpsertSession(session.clone()));

    assert_eq!(state.session_by_cli_session_id(&CliSessionId::new("cli-1")).unwrap().id, session.id);
    assert_eq!(state.session_by_message_id(&MessageId::new("m1")).unwrap().id, session.id);
}

#[test]
fn patch_rewriting_cli_session_id_moves_the_index_entry() {
    let mut state = MaterializedState::default();
    let mut session = sample_session();
    session.cli_session_id = Some(CliSessionId::new("cli-old"));
    state.apply_event(&StoreEvent::UpsertSession(session.clone()));

    let patch = SessionPatch {
        cli_session_id: Some(Some(CliSessionId::new("cli-new"))),
        ..Default::default()
    };
    state.apply_event(&StoreEvent::PatchSession { id: session.id.clone(), patch });

    assert!(state.session_by_cli_session_id(&CliSessionId::new("cli-old")).is_none());
    assert_eq!(state.session_by_cli_session_id(&CliSessionId::new("cli-new")).unwrap().id, session.id);
}

#[test]
fn patch_clearing_last_message_id_removes_the_stale_index_entry() {
    let mut state = MaterializedState::default();
    let mut session = sample_session();
    session.last_message_id = Some(MessageId::new("m-old"));
    state.apply_event(&StoreEvent::UpsertSession(session.clone()));

    let patch = SessionPatch { last_message_id: Some(None), ..Default::default() };
    state.apply_event(&StoreEvent::PatchSession { id: session.id.clone(), patch });

    // A later record chained off the now-stale id must not resolve back to
    // this session.
    assert!(state.session_by_message_id(&MessageId::new("m-old")).is_none());
}

#[test]
fn patch_rewriting_last_message_id_moves_the_index_entry() {
    let mut state = MaterializedState::default();
    let mut session = sample_session();
    session.last_message_id = Some(MessageId::new("m-old"));
    state.apply_event(&StoreEvent::UpsertSession(session.clone()));

    let patch = SessionPatch { last_message_id: Some(Some(MessageId::new("m-new"))), ..Default::default() };
    state.apply_event(&StoreEvent::PatchSession { id: session.id.clone(), patch });

    assert!(state.session_by_message_id(&MessageId::new("m-old")).is_none());
    assert_eq!(state.session_by_message_id(&MessageId::new("m-new")).unwrap().id, session.id);
}

#[test]
fn delete_session_removes_correlation_indices_and_clears_active() {
    let mut state = MaterializedState::default();
    let mut session = sample_session();
    session.last_message_id = Some(MessageId::new("m1"));
    state.apply_event(&StoreEvent::UpsertSession(session.clone()));
    state.apply_event(&StoreEvent::SetActiveSession { id: Some(session.id.clone()) });

    state.apply_event(&StoreEvent::DeleteSession { id: session.id.clone() });

    assert!(state.sessions.get(&session.id).is_none());
    assert!(state.session_by_message_id(&MessageId::new("m1")).is_none());
    assert!(state.active_session.is_none());
}

#[test]
fn delete_session_is_idempotent() {
    let mut state = MaterializedState::default();
    let id = SessionId::new("missing");
    state.apply_event(&StoreEvent::DeleteSession { id: id.clone() });
    state.apply_event(&StoreEvent::DeleteSession { id });
}

#[test]
fn execution_mapping_put_and_take_round_trips() {
    let mut state = MaterializedState::default();
    let cli_id = CliSessionId::new("cli-1");
    let entry = ExecutionMappingEntry {
        session_id: SessionId::new("s1"),
        terminal_id: TerminalId::new("t1"),
        start_time_epoch_ms: 42,
    };

    state.apply_event(&StoreEvent::PutExecutionMapping { cli_session_id: cli_id.clone(), entry: entry.clone() });
    assert!(state.execution_mapping.contains_key(&cli_id));

    state.apply_event(&StoreEvent::TakeExecutionMapping { cli_session_id: cli_id.clone() });
    assert!(!state.execution_mapping.contains_key(&cli_id));
}
