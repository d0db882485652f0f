// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Store's private write-ahead event type.
//!
//! Distinct from `cso_core::Broadcast`/`WatchEvent`: this is what gets
//! durably logged, not what gets shown to a client. One `StoreEvent` per
//! public Store mutation (§4.1).

use cso_core::{CliSessionId, JarvisMode, MessageId, Session, SessionId, TerminalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    UpsertSession(Session),
    PatchSession {
        id: SessionId,
        patch: SessionPatch,
    },
    DeleteSession {
        id: SessionId,
    },
    SetActiveSession {
        id: Option<SessionId>,
    },
    PutCorrelation {
        session_id: SessionId,
        message_id: MessageId,
    },
    RemoveCorrelation {
        session_id: SessionId,
    },
    PutExecutionMapping {
        cli_session_id: CliSessionId,
        entry: ExecutionMappingEntry,
    },
    TakeExecutionMapping {
        cli_session_id: CliSessionId,
    },
    SetPendingExecution {
        entry: Option<ExecutionMappingEntry>,
    },
    TakePendingExecution,
}

/// Partial update to a `Session` row. `None` means "leave unchanged"; fields
/// that can legitimately be cleared (e.g. `cli_session_id`) use a nested
/// `Option<Option<T>>` so "don't touch" and "set to null" are distinguishable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_session_id: Option<Option<CliSessionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Option<MessageId>>,
    pub jarvis_enabled: Option<bool>,
    pub mode: Option<JarvisMode>,
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assistant_text: Option<Option<String>>,
    pub claude_pid: Option<Option<u32>>,
    pub last_updated_epoch_ms: Option<u64>,
}

/// `{pendingExecution: {sessionId, terminalId, startTime}}` row (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMappingEntry {
    pub session_id: SessionId,
    pub terminal_id: TerminalId,
    pub start_time_epoch_ms: u64,
}
