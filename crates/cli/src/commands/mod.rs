// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod session;

use anyhow::Result;
use cso_gateway::ControlRequest;

use crate::client::ControlClient;
use crate::env::control_socket_path;

/// `cso ping` — confirms the daemon is reachable before a scripted tool
/// invocation relies on it.
pub async fn ping() -> Result<String> {
    let socket_path = control_socket_path()?;
    let mut client = ControlClient::connect(&socket_path).await?;
    match client.request(ControlRequest::Ping).await? {
        cso_gateway::ControlResponse::Pong => Ok("pong".to_string()),
        other => anyhow::bail!("unexpected response to ping: {other:?}"),
    }
}
