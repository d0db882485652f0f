// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from `StoreEvent` replay (§4.1, §6).

use crate::event::{ExecutionMappingEntry, StoreEvent};
use cso_core::{CliSessionId, MessageId, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The Store's full in-memory state, rebuilt by replaying the WAL from the
/// last snapshot. This is the only place session rows, the two correlation
/// indices, and the execution-mapping table live — everything else (Log
/// Watcher offsets, PTY buffers) is reconstructed at daemon start from
/// filesystem state, not from here.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<SessionId, Session>,
    pub active_session: Option<SessionId>,

    /// `cliSessionId → sessionId` (§4.4 step 1: "look up by cliSessionId").
    #[serde(default)]
    pub session_by_cli_session_id: HashMap<CliSessionId, SessionId>,
    /// `messageId → sessionId`, the Correlator's join key (§4.4 step 2).
    #[serde(default)]
    pub session_by_message_id: HashMap<MessageId, SessionId>,

    /// `cliSessionId → execution-mapping row` (§6, §3 new row type).
    #[serde(default)]
    pub execution_mapping: HashMap<CliSessionId, ExecutionMappingEntry>,
    /// The one outstanding `execute-plan` invocation awaiting its first log line.
    #[serde(default)]
    pub pending_execution: Option<ExecutionMappingEntry>,
}

impl MaterializedState {
    /// Apply one `StoreEvent`, deriving the next state.
    ///
    /// All handlers are idempotent (assignment, not mutation) since replay
    /// may re-apply an event already reflected by a snapshot.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::UpsertSession(session) => {
                if let Some(cli_id) = &session.cli_session_id {
                    self.session_by_cli_session_id.insert(cli_id.clone(), session.id.clone());
                }
                if let Some(msg_id) = &session.last_message_id {
                    self.session_by_message_id.insert(msg_id.clone(), session.id.clone());
                }
                self.sessions.insert(session.id.clone(), session.clone());
            }
            StoreEvent::PatchSession { id, patch } => {
                let Some(session) = self.sessions.get_mut(id) else {
                    return;
                };

                if let Some(name) = &patch.name {
                    session.name = name.clone();
                }
                if let Some(cli_session_id) = &patch.cli_session_id {
                    if let Some(old) = &session.cli_session_id {
                        self.session_by_cli_session_id.remove(old);
                    }
                    if let Some(new) = cli_session_id {
                        self.session_by_cli_session_id.insert(new.clone(), id.clone());
                    }
                    session.cli_session_id = cli_session_id.clone();
                }
                if let Some(last_message_id) = &patch.last_message_id {
                    if let Some(old) = &session.last_message_id {
                        self.session_by_message_id.remove(old);
                    }
                    if let Some(new) = last_message_id {
                        self.session_by_message_id.insert(new.clone(), id.clone());
                    }
                    session.last_message_id = last_message_id.clone();
                }
                if let Some(jarvis_enabled) = patch.jarvis_enabled {
                    session.jarvis_enabled = jarvis_enabled;
                }
                if let Some(mode) = patch.mode {
                    session.mode = mode;
                }
                if let Some(plan) = &patch.plan {
                    session.plan = plan.clone();
                }
                if let Some(last_assistant_text) = &patch.last_assistant_text {
                    session.last_assistant_text = last_assistant_text.clone();
                }
                if let Some(claude_pid) = patch.claude_pid {
                    session.claude_pid = claude_pid;
                }
                if let Some(ts) = patch.last_updated_epoch_ms {
                    session.last_updated_epoch_ms = ts;
                }
            }
            StoreEvent::DeleteSession { id } => {
                if let Some(session) = self.sessions.remove(id) {
                    if let Some(cli_id) = &session.cli_session_id {
                        self.session_by_cli_session_id.remove(cli_id);
                    }
                    if let Some(msg_id) = &session.last_message_id {
                        self.session_by_message_id.remove(msg_id);
                    }
                }
                if self.active_session.as_ref() == Some(id) {
                    self.active_session = None;
                }
            }
            StoreEvent::SetActiveSession { id } => {
                self.active_session = id.clone();
            }
            StoreEvent::PutCorrelation { session_id, message_id } => {
                self.session_by_message_id.insert(message_id.clone(), session_id.clone());
            }
            StoreEvent::RemoveCorrelation { session_id } => {
                self.session_by_message_id.retain(|_, v| v != session_id);
            }
            StoreEvent::PutExecutionMapping { cli_session_id, entry } => {
                self.execution_mapping.insert(cli_session_id.clone(), entry.clone());
            }
            StoreEvent::TakeExecutionMapping { cli_session_id } => {
                self.execution_mapping.remove(cli_session_id);
            }
            StoreEvent::SetPendingExecution { entry } => {
                self.pending_execution = entry.clone();
            }
            StoreEvent::TakePendingExecution => {
                self.pending_execution = None;
            }
        }
    }

    /// Look up a session by cli_session_id without touching the Store's lock,
    /// used by replay and by `Store::get_session_by_cli_session_id`.
    pub fn session_by_cli_session_id(&self, cli_session_id: &CliSessionId) -> Option<&Session> {
        self.session_by_cli_session_id
            .get(cli_session_id)
            .and_then(|id| self.sessions.get(id))
    }

    pub fn session_by_message_id(&self, message_id: &MessageId) -> Option<&Session> {
        self.session_by_message_id
            .get(message_id)
            .and_then(|id| self.sessions.get(id))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
