// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Session` entity and its Jarvis-mode sub-state.
//!
//! User-facing metadata (`name`, `projectPath`, ...) and controller state
//! (`mode`, `lastAssistantText`) are kept on one struct — the Store API is a
//! single row per `Session` — but `JarvisState` is split out so the Store and
//! the Jarvis Controller each reason about the piece they own without the
//! other leaking through (see the "mode flags living on the Session" note).

use crate::ids::{CliSessionId, MessageId, SessionId, TerminalId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Planning/execution sub-state, meaningful only while `jarvis_mode` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JarvisMode {
    /// Jarvis is off for this session.
    Unset,
    /// Collaborating with the user; assistant text is spoken via TTS.
    Planning,
    /// Running the stored plan one-shot; no TTS.
    Execution,
}

impl Default for JarvisMode {
    fn default() -> Self {
        JarvisMode::Unset
    }
}

/// The orchestrator's user-facing unit of work: one PTY, one AI CLI child,
/// one ongoing conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub created_epoch_ms: u64,
    pub terminal_id: TerminalId,
    pub project_path: PathBuf,

    /// The AI CLI's current log-file identifier. Null until first observed;
    /// rewritten by the Correlator whenever the CLI resumes/branches/clones.
    pub cli_session_id: Option<CliSessionId>,
    /// Most recent message id observed in this session's log chain; the
    /// Correlator's join key.
    pub last_message_id: Option<MessageId>,

    pub jarvis_enabled: bool,
    pub mode: JarvisMode,
    pub plan: String,
    /// Most recent text-type assistant utterance, for TTS de-duplication.
    pub last_assistant_text: Option<String>,

    pub claude_pid: Option<u32>,
    pub last_updated_epoch_ms: u64,
}

impl Session {
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        terminal_id: TerminalId,
        project_path: PathBuf,
        now_epoch_ms: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_epoch_ms: now_epoch_ms,
            terminal_id,
            project_path,
            cli_session_id: None,
            last_message_id: None,
            jarvis_enabled: false,
            mode: JarvisMode::Unset,
            plan: String::new(),
            last_assistant_text: None,
            claude_pid: None,
            last_updated_epoch_ms: now_epoch_ms,
        }
    }

    /// Whether a planning→execution transition is legal right now (§3 invariant:
    /// `plan` must be non-empty before any planning→execution transition).
    pub fn can_execute_plan(&self) -> bool {
        self.jarvis_enabled && self.mode == JarvisMode::Planning && !self.plan.trim().is_empty()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
