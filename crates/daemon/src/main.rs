// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! csod — background process that owns the Store, PTY Multiplexer, Log
//! Watcher and engine (Correlator/Session Registry/Jarvis Controller/
//! Scheduler), and exposes them over the Client Gateway (§4.8/§4.9).

use std::sync::Arc;
use std::time::Duration;

use cso_core::{Broadcast, EngineEvent, SystemClock, UuidIdGen, WatchEvent};
use cso_daemon::{acquire_lock, setup_logging, Config};
use cso_engine::{Correlator, JarvisController, Scheduler, SessionRegistry};
use cso_gateway::{ControlCtx, ControlServer, WsGateway};
use cso_pty::PtyMultiplexer;
use cso_store::Store;
use cso_watcher::start_watcher;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Snapshot the Store to disk on this cadence; bounds how much a crash can
/// force the Log Watcher to re-derive on the next startup.
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;
    let _lock = match acquire_lock(&config.lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("csod is already running ({e})");
            std::process::exit(1);
        }
    };

    info!(state_dir = %config.state_dir.display(), "starting cso daemon");

    if let Some(parent) = config.control_socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(Store::open(&config.state_dir)?);

    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let pty = PtyMultiplexer::new(engine_tx.clone());

    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(pty.clone());
    let registry = Arc::new(SessionRegistry::new(
        store.clone(),
        pty.clone(),
        SystemClock,
        UuidIdGen,
        broadcast_tx.clone(),
    ));
    let correlator = Arc::new(Correlator::new(store.clone(), registry.clone()));
    let jarvis =
        Arc::new(JarvisController::new(store.clone(), scheduler.clone(), SystemClock, broadcast_tx.clone()));

    let gateway = WsGateway::new(store.clone(), registry.clone(), jarvis.clone(), pty.clone(), scheduler.clone());
    gateway.spawn_broadcast_relay(broadcast_rx);

    let control_ctx = Arc::new(ControlCtx { store: store.clone(), registry: registry.clone(), jarvis: jarvis.clone() });
    let control_server = ControlServer::bind(&config.control_socket_path, control_ctx)?;
    tokio::spawn(control_server.run());

    let gateway_for_ws = gateway.clone();
    let gateway_addr = config.gateway_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = gateway_for_ws.bind_and_serve(&gateway_addr).await {
            error!(error = %e, "client gateway exited");
        }
    });

    let (watch_tx, mut watch_rx) = mpsc::channel::<WatchEvent>(256);
    let _watcher_shutdown = start_watcher(config.log_root.clone(), watch_tx);
    let watch_engine_tx = engine_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = watch_rx.recv().await {
            if watch_engine_tx.send(EngineEvent::Watch(event)).is_err() {
                break;
            }
        }
    });

    spawn_checkpoint_task(store.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(addr = %config.gateway_addr, socket = %config.control_socket_path.display(), "cso daemon ready");
    println!("READY");

    loop {
        tokio::select! {
            Some(event) = engine_rx.recv() => {
                dispatch_engine_event(event, &correlator, &jarvis, &broadcast_tx);
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            else => {
                info!("engine event bus closed, shutting down");
                break;
            }
        }
    }

    if let Err(e) = store.checkpoint() {
        warn!(error = %e, "final checkpoint failed");
    }
    Ok(())
}

fn dispatch_engine_event(
    event: EngineEvent,
    correlator: &Correlator<SystemClock, UuidIdGen>,
    jarvis: &JarvisController<SystemClock>,
    broadcast_tx: &mpsc::UnboundedSender<Broadcast>,
) {
    match event {
        EngineEvent::Watch(watch_event) => {
            if let Err(e) = correlator.handle(&watch_event) {
                warn!(error = %e, "correlator failed to process watch event");
            }
            match &watch_event {
                WatchEvent::AssistantText { cli_session_id, text, .. } => {
                    if let Err(e) = jarvis.on_assistant_text(cli_session_id, text) {
                        warn!(error = %e, "jarvis failed to process assistant text");
                    }
                }
                WatchEvent::Stop { cli_session_id } => {
                    if let Err(e) = jarvis.on_stop(cli_session_id) {
                        warn!(error = %e, "jarvis failed to process stop event");
                    }
                }
                WatchEvent::SessionStart { .. } | WatchEvent::UserPromptSubmit { .. } | WatchEvent::AssistantFirstResponse { .. } | WatchEvent::CorrelationCandidate { .. } => {}
            }
        }
        EngineEvent::TerminalExited { terminal_id, code } => {
            info!(%terminal_id, code, "terminal exited");
            let _ = broadcast_tx.send(Broadcast::TerminalExited { terminal_id, code });
        }
    }
}

fn spawn_checkpoint_task(store: Arc<Store>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.checkpoint() {
                warn!(error = %e, "periodic checkpoint failed");
            }
        }
    });
}
