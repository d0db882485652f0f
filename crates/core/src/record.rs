// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit tagged representation of one line of the AI CLI's JSONL log.
//!
//! The source relied on ad hoc `Option` field probing (`message.get("content")`,
//! `get_str(json, "type")`, ...) scattered across handlers. Here the raw JSON
//! is parsed once, exhaustively, into `LogRecord`, so every consumer — the
//! Log Watcher's event emitter, the Correlator, the Jarvis Controller — matches
//! on a closed enum instead of re-deriving the shape of the wire format.

use crate::ids::{CliSessionId, MessageId};
use serde::{Deserialize, Serialize};

/// One part of an assistant message's content array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolUse { name: String },
    ToolResult,
    #[serde(other)]
    Other,
}

/// A single parsed record from a session's append-only log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A user-authored input; the first one in a conversation has no parent.
    User {
        message_id: Option<MessageId>,
        parent_message_id: Option<MessageId>,
    },
    /// An assistant-authored turn. `stop_reason == Some("end_turn")` doubles
    /// as the end-of-turn marker (see §9 open question: the source treats
    /// every end-of-turn as a `stop`).
    Assistant {
        message_id: Option<MessageId>,
        parent_message_id: Option<MessageId>,
        content: Vec<ContentPart>,
        stop_reason: Option<String>,
    },
    /// An explicit end-of-turn record distinct from an assistant message.
    Stop {
        message_id: Option<MessageId>,
        parent_message_id: Option<MessageId>,
    },
}

impl LogRecord {
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            LogRecord::User { message_id, .. }
            | LogRecord::Assistant { message_id, .. }
            | LogRecord::Stop { message_id, .. } => message_id.as_ref(),
        }
    }

    pub fn parent_message_id(&self) -> Option<&MessageId> {
        match self {
            LogRecord::User {
                parent_message_id, ..
            }
            | LogRecord::Assistant {
                parent_message_id, ..
            }
            | LogRecord::Stop {
                parent_message_id, ..
            } => parent_message_id.as_ref(),
        }
    }

    /// The assistant's text content, if this is an assistant record carrying
    /// a `text` part, joined in order (tool-use/tool-result parts are ignored).
    pub fn assistant_text(&self) -> Option<String> {
        match self {
            LogRecord::Assistant { content, .. } => {
                let joined = content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("");
                if joined.is_empty() {
                    None
                } else {
                    Some(joined)
                }
            }
            _ => None,
        }
    }

    /// Whether this record denotes the end of an assistant turn.
    pub fn is_end_of_turn(&self) -> bool {
        matches!(self, LogRecord::Stop { .. })
            || matches!(
                self,
                LogRecord::Assistant { stop_reason: Some(r), .. } if r == "end_turn"
            )
    }
}

/// Parse one JSONL line into a `LogRecord`. Returns `None` on malformed input
/// or a record type the watcher doesn't track (caller logs-and-skips).
pub fn parse_record(line: &str) -> Option<LogRecord> {
    let json: serde_json::Value = serde_json::from_str(line).ok()?;
    let record_type = json.get("type")?.as_str()?;
    let message_id = json
        .get("messageId")
        .and_then(|v| v.as_str())
        .map(MessageId::new);
    let parent_message_id = json
        .get("parentMessageId")
        .and_then(|v| v.as_str())
        .map(MessageId::new);

    match record_type {
        "user" => Some(LogRecord::User {
            message_id,
            parent_message_id,
        }),
        "assistant" => {
            let message = json.get("message")?;
            let stop_reason = message
                .get("stop_reason")
                .and_then(|v| v.as_str())
                .map(String::from);
            let content = match message.get("content") {
                Some(serde_json::Value::Array(parts)) => parts
                    .iter()
                    .filter_map(|p| serde_json::from_value::<ContentPart>(p.clone()).ok())
                    .collect(),
                Some(serde_json::Value::String(s)) => vec![ContentPart::Text { text: s.clone() }],
                _ => Vec::new(),
            };
            Some(LogRecord::Assistant {
                message_id,
                parent_message_id,
                content,
                stop_reason,
            })
        }
        "stop" => Some(LogRecord::Stop {
            message_id,
            parent_message_id,
        }),
        _ => None,
    }
}

/// A record plus the `cliSessionId` (log-file identity) it was read from —
/// the unit the Log Watcher actually emits events about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRecord {
    pub cli_session_id: CliSessionId,
    pub record: LogRecord,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
