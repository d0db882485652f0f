// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed events that flow across the internal event bus (§2, §9).
//!
//! The Log Watcher is a pure publisher of `WatchEvent`; the Correlator,
//! Jarvis Controller and Session Registry are the only subscribers allowed
//! to mutate the Store, and they all run off one `EngineEvent` stream so the
//! per-session ordering guarantees in §5 fall out of "one consumer, one
//! queue" rather than needing their own locking protocol.

use crate::ids::{CliSessionId, SessionId, TerminalId};
use crate::record::LogRecord;

/// Semantic events the Log Watcher emits for one log-file stream.
///
/// All carry `cli_session_id`; ordering is guaranteed only within one
/// `cli_session_id` (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The stream was newly observed (first record read, or file freshly created).
    SessionStart { cli_session_id: CliSessionId },
    /// A user-authored input record.
    UserPromptSubmit {
        cli_session_id: CliSessionId,
        record: LogRecord,
    },
    /// An assistant-authored text record (distinct from tool-use/tool-result).
    AssistantText {
        cli_session_id: CliSessionId,
        text: String,
        record: LogRecord,
    },
    /// Convenience: the first assistant record seen in a stream since start.
    AssistantFirstResponse {
        cli_session_id: CliSessionId,
        record: LogRecord,
    },
    /// Every record carrying a message id — what the Correlator consumes.
    CorrelationCandidate {
        cli_session_id: CliSessionId,
        record: LogRecord,
    },
    /// End of one assistant turn.
    Stop { cli_session_id: CliSessionId },
}

impl WatchEvent {
    pub fn cli_session_id(&self) -> &CliSessionId {
        match self {
            WatchEvent::SessionStart { cli_session_id }
            | WatchEvent::UserPromptSubmit { cli_session_id, .. }
            | WatchEvent::AssistantText { cli_session_id, .. }
            | WatchEvent::AssistantFirstResponse { cli_session_id, .. }
            | WatchEvent::CorrelationCandidate { cli_session_id, .. }
            | WatchEvent::Stop { cli_session_id } => cli_session_id,
        }
    }
}

/// Top-level events flowing on the engine's internal bus: watch events from
/// the Log Watcher plus the handful of engine-internal signals (a scheduled
/// write firing, a PTY exiting) that the Correlator/Jarvis/Registry must also
/// react to.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Watch(WatchEvent),
    /// The PTY Multiplexer observed the child for `terminal_id` exit.
    TerminalExited { terminal_id: TerminalId, code: Option<i32> },
}

/// Fields changed by a Session mutation, for the `sessionUpdated` broadcast
/// contract (§4.5): "every mutation yields exactly one event... consumers
/// should not cache file paths derived from [cliSessionId]".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Name,
    CliSessionId,
    LastMessageId,
    JarvisEnabled,
    Mode,
    Plan,
    LastAssistantText,
}

/// Broadcast-worthy outcomes of a Registry/Correlator/Jarvis mutation,
/// destined for the Client Gateway.
#[derive(Debug, Clone)]
pub enum Broadcast {
    SessionCreated { session_id: SessionId },
    SessionUpdated { session_id: SessionId, fields: Vec<SessionField> },
    SessionDeleted { session_id: SessionId },
    SessionStatus { cli_session_id: CliSessionId, ready: bool },
    Tts { session_id: SessionId, text: String },
    TerminalOutput { terminal_id: TerminalId, bytes: Vec<u8> },
    TerminalExited { terminal_id: TerminalId, code: Option<i32> },
}
