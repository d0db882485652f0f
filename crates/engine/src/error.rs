// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] cso_store::StoreError),
    #[error(transparent)]
    Pty(#[from] cso_pty::PtyError),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("jarvis transition rejected: {0}")]
    InvalidTransition(String),
}
