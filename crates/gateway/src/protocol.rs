// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tagged-enum vocabulary shared by the browser-facing WebSocket feed
//! (§4.8) and the loopback control socket the CLI talks to (§4.9).
//!
//! Wire format for the control socket mirrors the teacher's IPC: a 4-byte
//! big-endian length prefix followed by a JSON payload (`protocol_wire.rs`).
//! The WebSocket side instead frames one JSON document per text message,
//! since `tokio-tungstenite` already does framing.

use cso_core::{CliSessionId, Session, SessionField, SessionId, TerminalId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
}

pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Broadcast-worthy events pushed to every subscribed browser UI (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GatewayEvent {
    TerminalOutput { terminal_id: TerminalId, bytes: Vec<u8> },
    TerminalReady { terminal_id: TerminalId },
    TerminalExit { terminal_id: TerminalId, code: Option<i32> },
    SessionList { sessions: Vec<Session>, active_session_id: Option<SessionId> },
    SessionCreated { session: Session },
    SessionUpdated { session_id: SessionId, fields: Vec<SessionField> },
    SessionJarvisUpdated { session_id: SessionId, enabled: bool },
    SessionStatusUpdate { cli_session_id: CliSessionId, status: SessionStatus },
    SessionDeleted { session_id: SessionId },
    Tts { session_id: SessionId, text: String, timestamp_epoch_ms: u64, length: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Ready,
}

/// Commands a browser UI may send inbound (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GatewayCommand {
    TerminalCreate { terminal_id: TerminalId },
    TerminalInput { terminal_id: TerminalId, bytes: Vec<u8> },
    TerminalResize { terminal_id: TerminalId, cols: u16, rows: u16 },
    TerminalKill { terminal_id: TerminalId },
    TerminalList,
    /// Paste + submit, the same two-step idiom as the Scheduler.
    TerminalExecute { terminal_id: TerminalId, command: String },
    TerminalScheduleExecution { terminal_id: TerminalId, delay_seconds: u64, command: String },

    SessionListCmd,
    SessionCreate { name: String, project_path: std::path::PathBuf },
    SessionSendMessage { session_id: SessionId, message: String },
    SessionToggleJarvis { session_id: SessionId, jarvis_mode: bool },
    /// Manual-trigger form used in testing: force a correlation link.
    SessionLinkCli { session_id: SessionId, cli_session_id: CliSessionId },
}

/// Request/response vocabulary for the CLI's loopback control socket (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlRequest {
    Ping,
    GetActiveSession,
    GetSession { session_id: SessionId },
    SetPlan { session_id: SessionId, plan: String },
    ViewPlan { session_id: SessionId },
    UpdateSession { session_id: SessionId, name: Option<String> },
    ExecutePlan { session_id: SessionId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlResponse {
    Pong,
    Ok,
    ActiveSession { session_id: Option<SessionId> },
    Session { session: Box<Session> },
    Plan { text: String },
    Error { message: String },
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: json.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(ProtocolError::ConnectionClosed),
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(reader: &mut R) -> Result<ControlRequest, ProtocolError> {
    let bytes = read_message(reader).await?;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &ControlResponse,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    write_message(writer, &data).await
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
