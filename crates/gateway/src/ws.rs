// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The WebSocket-facing half of the Client Gateway (§4.8): a broadcast feed
//! of `GatewayEvent`s to every connected browser UI, and inbound
//! `GatewayCommand`s dispatched into the Registry/PTY Multiplexer/Scheduler.
//!
//! Connection bookkeeping (subscriber set behind a lock, one task per
//! connection, debug-log queries / info-log mutations) follows the
//! teacher's `crates/daemon/src/listener/mod.rs` shape; the wire framing is
//! adapted to one JSON text frame per message instead of length-prefixed
//! bytes, since `tokio-tungstenite` already frames messages.

use cso_core::{Broadcast, Clock, IdGen, SessionField};
use cso_engine::{JarvisController, Scheduler, SessionRegistry};
use cso_pty::PtyMultiplexer;
use cso_store::Store;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::{GatewayCommand, GatewayEvent, SessionStatus};

/// Default interactive shell spawned for a freshly created Session. `sh -i`
/// because the orchestrator owns argv, not a user-chosen shell preference
/// (a future revision can read `$SHELL`).
const DEFAULT_SHELL: &str = "sh -i";

pub struct WsGateway<C: Clock, G: IdGen> {
    store: Arc<Store>,
    registry: Arc<SessionRegistry<C, G>>,
    jarvis: Arc<JarvisController<C>>,
    pty: Arc<PtyMultiplexer>,
    scheduler: Arc<Scheduler>,
    subscribers: DashMap<u64, mpsc::UnboundedSender<GatewayEvent>>,
    next_subscriber_id: AtomicU64,
}

impl<C: Clock + 'static, G: IdGen + 'static> WsGateway<C, G> {
    pub fn new(
        store: Arc<Store>,
        registry: Arc<SessionRegistry<C, G>>,
        jarvis: Arc<JarvisController<C>>,
        pty: Arc<PtyMultiplexer>,
        scheduler: Arc<Scheduler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            registry,
            jarvis,
            pty,
            scheduler,
            subscribers: DashMap::new(),
            next_subscriber_id: AtomicU64::new(1),
        })
    }

    /// Fans a translated engine `Broadcast` out to every connected UI.
    /// Spawned against the receiving end of the Registry/Jarvis/Correlator's
    /// shared broadcast channel. A freshly created Session's terminal has no
    /// subscriber yet, so seeing `SessionCreated` here also starts this
    /// terminal's output pump (§4.2/§4.8) — the one place a new `TerminalId`
    /// becomes visible to the gateway.
    pub fn spawn_broadcast_relay(self: &Arc<Self>, mut rx: mpsc::UnboundedReceiver<Broadcast>) {
        let gateway = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Broadcast::SessionCreated { session_id } = &event {
                    if let Some(session) = gateway.store.get_session(session_id) {
                        gateway.spawn_terminal_pump(session.terminal_id);
                    }
                }
                gateway.publish(translate_broadcast(event));
            }
        });
    }

    /// Forwards one terminal's raw output bytes into the broadcast feed
    /// until its PTY subscription closes (terminal killed or exited).
    fn spawn_terminal_pump(self: &Arc<Self>, terminal_id: cso_core::TerminalId) {
        let Ok((subscriber_id, mut rx)) = self.pty.subscribe(&terminal_id) else { return };
        let gateway = self.clone();
        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                gateway.publish(GatewayEvent::TerminalOutput { terminal_id: terminal_id.clone(), bytes });
            }
            gateway.pty.unsubscribe(&terminal_id, subscriber_id);
        });
    }

    /// Snapshot-then-iterate: never holds the subscriber-set lock while
    /// invoking a subscriber's channel send (§5).
    fn publish(&self, event: GatewayEvent) {
        let dead: Vec<u64> = self
            .subscribers
            .iter()
            .filter_map(|entry| if entry.value().send(event.clone()).is_err() { Some(*entry.key()) } else { None })
            .collect();
        for id in dead {
            self.subscribers.remove(&id);
        }
    }

    pub async fn bind_and_serve(self: Arc<Self>, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "client gateway listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            let gateway = self.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.handle_connection(stream).await {
                    warn!(%peer, error = %e, "gateway connection error");
                }
            });
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        let ws = tokio_tungstenite::accept_async(stream).await?;
        let (mut sink, mut stream) = ws.split();

        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx.clone());

        // Initial sync: every new connection gets the current Session list.
        let _ = tx.send(GatewayEvent::SessionList {
            sessions: self.store.list_sessions(),
            active_session_id: self.store.get_active_session(),
        });

        let outbound = async {
            while let Some(event) = rx.recv().await {
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        };

        let gateway = self.clone();
        let reply_tx = tx.clone();
        let inbound = async move {
            while let Some(msg) = stream.next().await {
                let Ok(msg) = msg else { break };
                let Message::Text(text) = msg else { continue };
                match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(command) => gateway.dispatch(command, &reply_tx),
                    Err(e) => debug!(error = %e, "malformed gateway command, ignoring"),
                }
            }
        };

        tokio::select! {
            _ = outbound => {}
            _ = inbound => {}
        }

        self.subscribers.remove(&id);
        Ok(())
    }

    fn dispatch(&self, command: GatewayCommand, reply_tx: &mpsc::UnboundedSender<GatewayEvent>) {
        match command {
            GatewayCommand::TerminalCreate { terminal_id } => {
                debug!(%terminal_id, "terminal create requested");
                if let Err(e) = self.pty.create(terminal_id, std::env::current_dir().unwrap_or_default().as_path(), DEFAULT_SHELL, &[], 24, 80) {
                    warn!(error = %e, "terminal create failed");
                }
            }
            GatewayCommand::TerminalInput { terminal_id, bytes } => {
                if let Err(e) = self.pty.write(&terminal_id, &bytes) {
                    debug!(%terminal_id, error = %e, "terminal input failed");
                }
            }
            GatewayCommand::TerminalResize { terminal_id, cols, rows } => {
                if let Err(e) = self.pty.resize(&terminal_id, rows, cols) {
                    debug!(%terminal_id, error = %e, "terminal resize failed");
                }
            }
            GatewayCommand::TerminalKill { terminal_id } => {
                info!(%terminal_id, "terminal kill requested");
                let _ = self.pty.kill(&terminal_id);
            }
            GatewayCommand::TerminalList => {
                let _ = reply_tx.send(GatewayEvent::SessionList {
                    sessions: self.store.list_sessions(),
                    active_session_id: self.store.get_active_session(),
                });
            }
            GatewayCommand::TerminalExecute { terminal_id, command } => {
                info!(%terminal_id, "terminal execute requested");
                self.scheduler.schedule(terminal_id, Duration::ZERO, command.into_bytes());
            }
            GatewayCommand::TerminalScheduleExecution { terminal_id, delay_seconds, command } => {
                info!(%terminal_id, delay_seconds, "terminal scheduled execution requested");
                self.scheduler.schedule(terminal_id, Duration::from_secs(delay_seconds), command.into_bytes());
            }
            GatewayCommand::SessionListCmd => {
                let _ = reply_tx.send(GatewayEvent::SessionList {
                    sessions: self.store.list_sessions(),
                    active_session_id: self.store.get_active_session(),
                });
            }
            GatewayCommand::SessionCreate { name, project_path } => {
                info!(%name, "session create requested");
                if let Err(e) = self.registry.create_session(name, project_path, DEFAULT_SHELL, &[]) {
                    warn!(error = %e, "session create failed");
                }
            }
            GatewayCommand::SessionSendMessage { session_id, message } => {
                let Some(session) = self.store.get_session(&session_id) else {
                    debug!(%session_id, "send-message for unknown session, ignoring");
                    return;
                };
                self.scheduler.schedule(session.terminal_id, Duration::ZERO, message.into_bytes());
            }
            GatewayCommand::SessionToggleJarvis { session_id, jarvis_mode } => {
                info!(%session_id, jarvis_mode, "jarvis toggle requested");
                if let Err(e) = self.jarvis.toggle(&session_id, jarvis_mode) {
                    warn!(%session_id, error = %e, "jarvis toggle failed");
                }
            }
            GatewayCommand::SessionLinkCli { session_id, cli_session_id } => {
                info!(%session_id, %cli_session_id, "manual link-cli requested");
                if let Err(e) = self.registry.link_cli(&session_id, cli_session_id, None) {
                    warn!(%session_id, error = %e, "link-cli failed");
                }
            }
        }
    }
}

fn translate_broadcast(event: Broadcast) -> GatewayEvent {
    match event {
        Broadcast::SessionCreated { session_id } => {
            GatewayEvent::SessionUpdated { session_id, fields: vec![SessionField::Name] }
        }
        Broadcast::SessionUpdated { session_id, fields } => GatewayEvent::SessionUpdated { session_id, fields },
        Broadcast::SessionDeleted { session_id } => GatewayEvent::SessionDeleted { session_id },
        Broadcast::SessionStatus { cli_session_id, ready } => GatewayEvent::SessionStatusUpdate {
            cli_session_id,
            status: if ready { SessionStatus::Ready } else { SessionStatus::Loading },
        },
        Broadcast::Tts { session_id, text } => {
            let length = text.len();
            GatewayEvent::Tts { session_id, text, timestamp_epoch_ms: 0, length }
        }
        Broadcast::TerminalOutput { terminal_id, bytes } => GatewayEvent::TerminalOutput { terminal_id, bytes },
        Broadcast::TerminalExited { terminal_id, code } => GatewayEvent::TerminalExit { terminal_id, code },
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
