// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Registry (§4.5): the canonical Session list, creation/deletion,
//! and thin Store wrappers that also broadcast — generalized from the
//! teacher's `Runtime<S, A, N, C>` generic-over-Clock/IdGen shape.

use cso_core::{
    Broadcast, Clock, IdGen, Session, SessionField, SessionId, SystemClock, TerminalId, UuidIdGen,
};
use cso_pty::PtyMultiplexer;
use cso_store::{SessionPatch, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Which Store/terminal sub-steps a `delete_session` call actually managed to
/// complete; partial failures are allowed and reported, not swallowed (§4.5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub session_row_removed: bool,
    pub terminal_killed: bool,
    pub correlation_cleared: bool,
}

/// Default PTY size for a freshly created terminal.
const DEFAULT_ROWS: u16 = 24;
const DEFAULT_COLS: u16 = 80;

pub struct SessionRegistry<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    store: Arc<Store>,
    pty: Arc<PtyMultiplexer>,
    clock: C,
    id_gen: G,
    broadcast_tx: mpsc::UnboundedSender<Broadcast>,
}

impl<C: Clock, G: IdGen> SessionRegistry<C, G> {
    pub fn new(
        store: Arc<Store>,
        pty: Arc<PtyMultiplexer>,
        clock: C,
        id_gen: G,
        broadcast_tx: mpsc::UnboundedSender<Broadcast>,
    ) -> Self {
        Self { store, pty, clock, id_gen, broadcast_tx }
    }

    fn broadcast(&self, event: Broadcast) {
        let _ = self.broadcast_tx.send(event);
    }

    /// Allocates ids, persists via the Store, and allocates a Terminal. Does
    /// not start the AI CLI — that happens on the first PTY write (§4.5).
    pub fn create_session(
        &self,
        name: impl Into<String>,
        project_path: PathBuf,
        shell_cmd: &str,
        env: &[(String, String)],
    ) -> Result<Session, EngineError> {
        let id = SessionId::new(self.id_gen.next());
        let terminal_id = TerminalId::new(self.id_gen.next());

        self.pty.create(terminal_id.clone(), &project_path, shell_cmd, env, DEFAULT_ROWS, DEFAULT_COLS)?;

        let session = Session::new(id.clone(), name, terminal_id, project_path, self.clock.epoch_ms());
        self.store.upsert_session(session.clone())?;
        self.broadcast(Broadcast::SessionCreated { session_id: id });
        Ok(session)
    }

    /// Creates a Session pre-bound to an existing on-disk CLI log, for
    /// adopting a previously-orphaned conversation.
    pub fn promote_session(
        &self,
        cli_session_id: cso_core::CliSessionId,
        name: impl Into<String>,
        project_path: PathBuf,
        shell_cmd: &str,
        env: &[(String, String)],
    ) -> Result<Session, EngineError> {
        let id = SessionId::new(self.id_gen.next());
        let terminal_id = TerminalId::new(self.id_gen.next());

        self.pty.create(terminal_id.clone(), &project_path, shell_cmd, env, DEFAULT_ROWS, DEFAULT_COLS)?;

        let mut session = Session::new(id.clone(), name, terminal_id, project_path, self.clock.epoch_ms());
        session.cli_session_id = Some(cli_session_id);
        self.store.upsert_session(session.clone())?;
        self.broadcast(Broadcast::SessionCreated { session_id: id });
        Ok(session)
    }

    /// Best-effort teardown: reports which sub-steps succeeded rather than
    /// failing the whole call on a partial failure.
    pub fn delete_session(&self, id: &SessionId) -> DeleteOutcome {
        let mut outcome = DeleteOutcome::default();

        let session = self.store.get_session(id);
        if let Some(session) = &session {
            outcome.terminal_killed = self.pty.kill(&session.terminal_id).is_ok();
            self.pty.forget(&session.terminal_id);
        }

        outcome.correlation_cleared = self.store.remove_correlation(id).is_ok();
        outcome.session_row_removed = self.store.delete_session(id).is_ok();

        if outcome.session_row_removed {
            self.broadcast(Broadcast::SessionDeleted { session_id: id.clone() });
        }
        outcome
    }

    pub fn update_jarvis_enabled(&self, id: &SessionId, enabled: bool) -> Result<(), EngineError> {
        let patch = SessionPatch { jarvis_enabled: Some(enabled), ..Default::default() };
        self.store.patch_session(id, patch)?;
        self.broadcast(Broadcast::SessionUpdated { session_id: id.clone(), fields: vec![SessionField::JarvisEnabled] });
        Ok(())
    }

    pub fn update_mode(&self, id: &SessionId, mode: cso_core::JarvisMode) -> Result<(), EngineError> {
        let patch = SessionPatch { mode: Some(mode), ..Default::default() };
        self.store.patch_session(id, patch)?;
        self.broadcast(Broadcast::SessionUpdated { session_id: id.clone(), fields: vec![SessionField::Mode] });
        Ok(())
    }

    pub fn update_plan(&self, id: &SessionId, plan: impl Into<String>) -> Result<(), EngineError> {
        let patch = SessionPatch { plan: Some(plan.into()), ..Default::default() };
        self.store.patch_session(id, patch)?;
        self.broadcast(Broadcast::SessionUpdated { session_id: id.clone(), fields: vec![SessionField::Plan] });
        Ok(())
    }

    pub fn set_active(&self, id: &SessionId) -> Result<(), EngineError> {
        self.store.set_active_session(Some(id.clone()))?;
        Ok(())
    }

    /// Called by the Correlator (§4.4); also broadcasts. Enforces the
    /// at-most-one-Session-per-cliSessionId invariant: if another Session
    /// already claims `cli_session_id`, its claim is cleared and the event is
    /// logged loudly (§7: "logged loudly; the later claim wins").
    pub fn link_cli(
        &self,
        id: &SessionId,
        cli_session_id: cso_core::CliSessionId,
        message_id: Option<cso_core::MessageId>,
    ) -> Result<(), EngineError> {
        if let Some(existing) = self.store.lookup_session_by_cli_session_id(&cli_session_id) {
            if &existing != id {
                tracing::warn!(
                    %cli_session_id,
                    existing_session = %existing,
                    new_session = %id,
                    "cliSessionId claimed by two sessions, clearing the earlier claim"
                );
                let _ = self.store.patch_session(
                    &existing,
                    SessionPatch { cli_session_id: Some(None), ..Default::default() },
                );
            }
        }

        let mut patch = SessionPatch { cli_session_id: Some(Some(cli_session_id)), ..Default::default() };
        if let Some(mid) = &message_id {
            patch.last_message_id = Some(Some(mid.clone()));
        }
        self.store.patch_session(id, patch)?;
        if let Some(mid) = &message_id {
            self.store.put_correlation(id, mid)?;
        }

        self.broadcast(Broadcast::SessionUpdated {
            session_id: id.clone(),
            fields: vec![SessionField::CliSessionId, SessionField::LastMessageId],
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
