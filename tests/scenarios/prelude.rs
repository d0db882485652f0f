// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture-building helpers for the end-to-end scenario tests
//! (§8), mirroring the per-crate fixtures in `cso-engine`'s own unit
//! tests rather than improvising setup per scenario.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use cso_core::{CliSessionId, FakeClock, SequentialIdGen};
use cso_engine::{Correlator, JarvisController, Scheduler, SessionRegistry};
use cso_pty::PtyMultiplexer;
use cso_store::Store;
use tokio::sync::mpsc;

pub struct Fixture {
    pub store: Arc<Store>,
    pub pty: Arc<PtyMultiplexer>,
    pub registry: Arc<SessionRegistry<FakeClock, SequentialIdGen>>,
    pub correlator: Arc<Correlator<FakeClock, SequentialIdGen>>,
    pub jarvis: Arc<JarvisController<FakeClock>>,
    pub broadcast_rx: mpsc::UnboundedReceiver<cso_core::Broadcast>,
    pub _dir: tempfile::TempDir,
}

pub fn new_fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("open store"));
    let (pty_events_tx, _pty_events_rx) = mpsc::unbounded_channel();
    let pty = PtyMultiplexer::new(pty_events_tx);
    let scheduler = Scheduler::new(pty.clone());
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let registry = Arc::new(SessionRegistry::new(
        store.clone(),
        pty.clone(),
        FakeClock::new(),
        SequentialIdGen::new("id"),
        broadcast_tx.clone(),
    ));
    let correlator = Arc::new(Correlator::new(store.clone(), registry.clone()));
    let jarvis = Arc::new(JarvisController::new(store.clone(), scheduler, FakeClock::new(), broadcast_tx));

    Fixture { store, pty, registry, correlator, jarvis, broadcast_rx, _dir: dir }
}

/// Every test's Session is backed by a real but trivial child process
/// (`cat`), echoing the shape of `cso-engine`'s own fixtures.
pub fn create_session(fx: &Fixture, name: &str) -> cso_core::Session {
    fx.registry.create_session(name, PathBuf::from("/tmp"), "cat", &[]).expect("create session")
}

pub fn cli_id(raw: &str) -> CliSessionId {
    CliSessionId::new(raw)
}
