// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Correlator (§4.4): joins incoming log records to Sessions by walking
//! the parent-message-id chain. Deliberately has no filesystem-scan
//! fallback — §9 explains why that caused an event-amplification loop in
//! the source design.

use cso_core::{Clock, IdGen, LogRecord, SystemClock, UuidIdGen, WatchEvent};
use cso_store::Store;
use std::sync::Arc;

use crate::error::EngineError;
use crate::registry::SessionRegistry;

pub struct Correlator<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    store: Arc<Store>,
    registry: Arc<SessionRegistry<C, G>>,
}

impl<C: Clock, G: IdGen> Correlator<C, G> {
    pub fn new(store: Arc<Store>, registry: Arc<SessionRegistry<C, G>>) -> Self {
        Self { store, registry }
    }

    /// Only `correlationCandidate` carries correlation-relevant data; every
    /// other `WatchEvent` variant is ignored here (the Jarvis Controller
    /// handles `assistantText`/`stop`, §4.6).
    pub fn handle(&self, event: &WatchEvent) -> Result<(), EngineError> {
        if let WatchEvent::CorrelationCandidate { cli_session_id, record } = event {
            self.correlate(cli_session_id, record)?;
        }
        Ok(())
    }

    fn correlate(&self, cli_session_id: &cso_core::CliSessionId, record: &LogRecord) -> Result<(), EngineError> {
        let message_id = record.message_id().cloned();
        match record.parent_message_id() {
            None => self.handle_root(cli_session_id, message_id),
            Some(parent) => self.handle_chained(cli_session_id, parent, message_id),
        }
    }

    /// Step 1: a conversation root (no parent).
    fn handle_root(
        &self,
        cli_session_id: &cso_core::CliSessionId,
        message_id: Option<cso_core::MessageId>,
    ) -> Result<(), EngineError> {
        if let Some(session) = self.find_unbound_session() {
            self.registry.link_cli(&session.id, cli_session_id.clone(), message_id)?;
            return Ok(());
        }

        if let Some(entry) = self.store.take_pending_execution()? {
            tracing::info!(
                %cli_session_id,
                session_id = %entry.session_id,
                "orphan conversation root matched pending execution, linking as continuation"
            );
            self.registry.link_cli(&entry.session_id, cli_session_id.clone(), message_id)?;
            return Ok(());
        }

        tracing::debug!(%cli_session_id, "orphan conversation root, no tracked session");
        Ok(())
    }

    /// Step 2: the record continues a chain via `parentMessageId`.
    fn handle_chained(
        &self,
        cli_session_id: &cso_core::CliSessionId,
        parent: &cso_core::MessageId,
        message_id: Option<cso_core::MessageId>,
    ) -> Result<(), EngineError> {
        let Some(session_id) = self.store.lookup_session_by_message_id(parent) else {
            tracing::debug!(%cli_session_id, parent = %parent, "correlation chain missed, ignoring");
            return Ok(());
        };

        self.registry.link_cli(&session_id, cli_session_id.clone(), message_id)?;
        Ok(())
    }

    fn find_unbound_session(&self) -> Option<cso_core::Session> {
        self.store.list_sessions().into_iter().find(|s| s.cli_session_id.is_none())
    }
}

#[cfg(test)]
#[path = "correlator_tests.rs"]
mod tests;
