// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cso session` subcommands — the External Tool Invoker surface (§4.9).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use cso_core::SessionId;
use cso_gateway::ControlRequest;

use crate::client::ControlClient;
use crate::env::control_socket_path;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Print the id of the currently active session, if any
    Active,
    /// Print a session's stored fields as JSON
    Show {
        session_id: String,
    },
    /// Replace a session's stored plan text
    SetPlan {
        session_id: String,
        plan: String,
    },
    /// Print a session's stored plan text
    ViewPlan {
        session_id: String,
    },
    /// Rename a session
    Update {
        session_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Transition a session from planning to execution, injecting the
    /// accumulated plan into its terminal. This is the one command the
    /// embedded AI CLI is expected to invoke as a tool call when the user
    /// approves a plan (§4.9).
    ExecutePlan {
        session_id: String,
    },
}

/// Runs the requested subcommand and returns the short human-readable string
/// the CLI prints to stdout (§4.9: "Return a short human-readable success or
/// failure string to the CLI, which the CLI renders to the user").
pub async fn run(args: SessionArgs) -> Result<String> {
    let socket_path = control_socket_path()?;
    let mut client = ControlClient::connect(&socket_path).await?;

    let request = match args.command {
        SessionCommand::Active => ControlRequest::GetActiveSession,
        SessionCommand::Show { session_id } => ControlRequest::GetSession { session_id: SessionId::new(session_id) },
        SessionCommand::SetPlan { session_id, plan } => {
            ControlRequest::SetPlan { session_id: SessionId::new(session_id), plan }
        }
        SessionCommand::ViewPlan { session_id } => {
            ControlRequest::ViewPlan { session_id: SessionId::new(session_id) }
        }
        SessionCommand::Update { session_id, name } => {
            ControlRequest::UpdateSession { session_id: SessionId::new(session_id), name }
        }
        SessionCommand::ExecutePlan { session_id } => {
            ControlRequest::ExecutePlan { session_id: SessionId::new(session_id) }
        }
    };

    render(client.request(request).await?)
}

fn render(response: cso_gateway::ControlResponse) -> Result<String> {
    use cso_gateway::ControlResponse as R;
    match response {
        R::Pong => Ok("pong".to_string()),
        R::Ok => Ok("ok".to_string()),
        R::ActiveSession { session_id: Some(id) } => Ok(id.to_string()),
        R::ActiveSession { session_id: None } => Ok("no active session".to_string()),
        R::Session { session } => Ok(serde_json::to_string_pretty(&session)?),
        R::Plan { text } => Ok(text),
        R::Error { message } => bail!(message),
    }
}
