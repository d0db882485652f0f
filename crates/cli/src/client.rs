// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket client for CLI commands (§4.9) — a thin wrapper around
//! one `ControlRequest`/`ControlResponse` round trip, grounded in the
//! teacher's `DaemonClient` (`crates/cli/src/client.rs`).

use std::path::Path;

use cso_gateway::{decode, encode, read_message, write_message, ControlRequest, ControlResponse, ProtocolError};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cso daemon is not running (no control socket at {0})")]
    DaemonNotRunning(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine state directory")]
    NoStateDir,
}

pub struct ControlClient {
    stream: UnixStream,
}

impl ControlClient {
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|_| ClientError::DaemonNotRunning(socket_path.display().to_string()))?;
        Ok(Self { stream })
    }

    pub async fn request(&mut self, request: ControlRequest) -> Result<ControlResponse, ClientError> {
        let (mut reader, mut writer) = self.stream.split();
        write_message(&mut writer, &encode(&request)?).await?;
        let bytes = read_message(&mut reader).await?;
        Ok(decode(&bytes)?)
    }
}
