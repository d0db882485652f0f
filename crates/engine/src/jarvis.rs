// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Jarvis Controller (§4.6): the planning/execution state machine.
//!
//! Grounded in the teacher's per-entity state machine driven by events off
//! the bus (`crates/engine/src/runtime/handlers`), with fixed delays named in
//! one place rather than scattered magic numbers — the same shape as the
//! teacher's own `LIVENESS_INTERVAL`/cooldown constants.

use cso_core::{
    Broadcast, CliSessionId, Clock, JarvisMode, Session, SessionField, SessionId, SystemClock,
};
use cso_store::{SessionPatch, Store};
use dashmap::DashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::scheduler::{Scheduler, SUBMIT_SETTLE};

/// Jarvis's fixed delays (§4.6, §5): not tunable knobs, fixed characteristics
/// of the embedded CLI's input behavior.
pub mod delays {
    use std::time::Duration;

    pub const CLEAR_CONTEXT: Duration = Duration::from_secs(8);
    pub const EXECUTION_PROMPT: Duration = Duration::from_secs(11);
    pub const POST_EXECUTION_QUIESCE: Duration = Duration::from_secs(2);
}

const CLEAR_CONTEXT_COMMAND: &str = "/clear";

pub struct JarvisController<C: Clock = SystemClock> {
    store: Arc<Store>,
    scheduler: Arc<Scheduler>,
    clock: C,
    /// Per-Session reentrancy guard: set while a planning prompt injection is
    /// in flight, so a duplicate trigger during the quiescence window is a
    /// no-op (§4.6: "must not inject a planning prompt while the last one is
    /// still being written").
    injecting: Arc<DashSet<SessionId>>,
    broadcast_tx: mpsc::UnboundedSender<Broadcast>,
}

impl<C: Clock> JarvisController<C> {
    pub fn new(
        store: Arc<Store>,
        scheduler: Arc<Scheduler>,
        clock: C,
        broadcast_tx: mpsc::UnboundedSender<Broadcast>,
    ) -> Self {
        Self { store, scheduler, clock, injecting: Arc::new(DashSet::new()), broadcast_tx }
    }

    fn broadcast(&self, event: Broadcast) {
        let _ = self.broadcast_tx.send(event);
    }

    /// `disabled -> planning` on toggle-to-true; any mode `-> disabled` (here
    /// represented as `JarvisMode::Unset`) on toggle-to-false.
    pub fn toggle(&self, id: &SessionId, enabled: bool) -> Result<(), EngineError> {
        let session = self.store.get_session(id).ok_or_else(|| EngineError::SessionNotFound(id.to_string()))?;

        if !enabled {
            let patch = SessionPatch {
                jarvis_enabled: Some(false),
                mode: Some(JarvisMode::Unset),
                ..Default::default()
            };
            self.store.patch_session(id, patch)?;
            self.broadcast(Broadcast::SessionUpdated {
                session_id: id.clone(),
                fields: vec![SessionField::JarvisEnabled, SessionField::Mode],
            });
            return Ok(());
        }

        if session.mode != JarvisMode::Unset {
            // Idempotent: Jarvis is already on, the second toggle does not
            // re-inject a planning prompt (§8).
            let patch = SessionPatch { jarvis_enabled: Some(true), ..Default::default() };
            self.store.patch_session(id, patch)?;
            self.broadcast(Broadcast::SessionUpdated {
                session_id: id.clone(),
                fields: vec![SessionField::JarvisEnabled],
            });
            return Ok(());
        }

        let patch = SessionPatch {
            jarvis_enabled: Some(true),
            mode: Some(JarvisMode::Planning),
            ..Default::default()
        };
        self.store.patch_session(id, patch)?;
        self.broadcast(Broadcast::SessionUpdated {
            session_id: id.clone(),
            fields: vec![SessionField::JarvisEnabled, SessionField::Mode],
        });

        self.inject_planning_prompt(&session, PromptIntro::Initial, Duration::ZERO);
        Ok(())
    }

    /// `planning -> planning` on each `assistantText`: de-duplicated TTS relay.
    pub fn on_assistant_text(&self, cli_session_id: &CliSessionId, text: &str) -> Result<(), EngineError> {
        let Some(session_id) = self.store.lookup_session_by_cli_session_id(cli_session_id) else {
            return Ok(());
        };
        let Some(session) = self.store.get_session(&session_id) else {
            return Ok(());
        };
        if session.mode != JarvisMode::Planning {
            return Ok(());
        }
        if session.last_assistant_text.as_deref() == Some(text) {
            return Ok(());
        }

        let patch = SessionPatch { last_assistant_text: Some(Some(text.to_string())), ..Default::default() };
        self.store.patch_session(&session_id, patch)?;
        self.broadcast(Broadcast::SessionUpdated {
            session_id: session_id.clone(),
            fields: vec![SessionField::LastAssistantText],
        });
        self.broadcast(Broadcast::Tts { session_id, text: text.to_string() });
        Ok(())
    }

    /// `planning -> execution`, triggered by the `execute_plan` tool (§4.9).
    pub fn execute_plan(&self, id: &SessionId) -> Result<(), EngineError> {
        let session = self.store.get_session(id).ok_or_else(|| EngineError::SessionNotFound(id.to_string()))?;
        if !session.can_execute_plan() {
            return Err(EngineError::InvalidTransition(format!("session {id} is not in a plannable state")));
        }

        let patch = SessionPatch {
            mode: Some(JarvisMode::Execution),
            cli_session_id: Some(None),
            last_message_id: Some(None),
            ..Default::default()
        };
        self.store.patch_session(id, patch)?;
        self.store.set_pending_execution(id, &session.terminal_id, self.clock.epoch_ms())?;

        self.scheduler.schedule(
            session.terminal_id.clone(),
            delays::CLEAR_CONTEXT,
            CLEAR_CONTEXT_COMMAND.as_bytes().to_vec(),
        );
        self.scheduler.schedule(
            session.terminal_id.clone(),
            delays::EXECUTION_PROMPT,
            execution_prompt(id, &session.plan).into_bytes(),
        );

        self.broadcast(Broadcast::SessionUpdated {
            session_id: id.clone(),
            fields: vec![SessionField::Mode, SessionField::CliSessionId, SessionField::LastMessageId],
        });
        Ok(())
    }

    /// `execution -> planning`, on the `stop` event while in execution mode.
    pub fn on_stop(&self, cli_session_id: &CliSessionId) -> Result<(), EngineError> {
        let Some(session_id) = self.store.lookup_session_by_cli_session_id(cli_session_id) else {
            return Ok(());
        };
        let Some(session) = self.store.get_session(&session_id) else {
            return Ok(());
        };
        if session.mode != JarvisMode::Execution {
            return Ok(());
        }
        if !self.injecting.insert(session_id.clone()) {
            // A prior stop already started the return-to-planning sequence;
            // duplicate stop events during quiescence are ignored.
            return Ok(());
        }

        let patch = SessionPatch { mode: Some(JarvisMode::Planning), ..Default::default() };
        self.store.patch_session(&session_id, patch)?;
        self.broadcast(Broadcast::SessionUpdated { session_id: session_id.clone(), fields: vec![SessionField::Mode] });

        self.inject_planning_prompt(&session, PromptIntro::PostExecution, delays::POST_EXECUTION_QUIESCE);
        Ok(())
    }

    /// Schedules the Planning Prompt after `delay`, holding the per-Session
    /// reentrancy flag until the injection has had time to land.
    fn inject_planning_prompt(&self, session: &Session, intro: PromptIntro, delay: Duration) {
        self.injecting.insert(session.id.clone());
        let prompt = planning_prompt(&session.id, intro);
        self.scheduler.schedule(session.terminal_id.clone(), delay, prompt.into_bytes());

        let injecting = self.injecting.clone();
        let session_id = session.id.clone();
        let release_after = delay + SUBMIT_SETTLE + Duration::from_secs(1);
        tokio::spawn(async move {
            tokio::time::sleep(release_after).await;
            injecting.remove(&session_id);
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum PromptIntro {
    Initial,
    PostExecution,
}

fn planning_prompt(session_id: &SessionId, intro: PromptIntro) -> String {
    let preamble = match intro {
        PromptIntro::Initial => "You are now in planning mode.",
        PromptIntro::PostExecution => "Execution finished; you are back in planning mode.",
    };
    format!(
        "{preamble} The user is not looking at the screen right now, so keep responses brief. \
Session id: {session_id}. Use the update-plan tool to record the plan as it firms up, and the \
view-plan tool to check the plan currently on file. Do not start implementing yet."
    )
}

fn execution_prompt(session_id: &SessionId, plan: &str) -> String {
    format!(
        "Mode: execution. Session id: {session_id}. Implement the following plan thoroughly, \
in one pass, without asking for confirmation:\n\n{plan}"
    )
}

#[cfg(test)]
#[path = "jarvis_tests.rs"]
mod tests;
