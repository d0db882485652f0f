// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cso-store: the durable Store component (§4.1) — sessions, correlation
//! rows, the active-session pointer, and the execution-mapping table, backed
//! by a group-committed JSONL write-ahead log and periodic snapshots.

mod checkpoint;
mod error;
mod event;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{CheckpointHandle, CheckpointResult, Checkpointer};
pub use error::StoreError;
pub use event::{ExecutionMappingEntry, SessionPatch, StoreEvent};
pub use snapshot::Snapshot;
pub use state::MaterializedState;
pub use store::Store;
pub use wal::{Wal, WalEntry};
