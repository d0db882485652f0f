// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for the entities the orchestrator tracks.
//!
//! Kept as distinct types (rather than bare `String`s) so a `SessionId` can
//! never be passed where a `CliSessionId` or `TerminalId` is expected —
//! the three are easy to confuse because they are often equal in value
//! during a session's first turn and diverge later (see `Correlator`).

crate::define_id! {
    /// Process-unique, stable-for-lifetime identifier for a `Session`.
    pub struct SessionId;
}

crate::define_id! {
    /// Handle into the PTY Multiplexer. 1:1 with a `Session` for its lifetime.
    pub struct TerminalId;
}

/// The AI CLI's own identifier for the current conversation; the name of the
/// log file it appends to. Mutable across the life of one `Session`.
crate::define_id! {
    pub struct CliSessionId;
}

/// Per-record identifier forming the parent-chain the Correlator walks.
crate::define_id! {
    pub struct MessageId;
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
