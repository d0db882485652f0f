// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Scheduler (§4.7): fire-and-forget delayed delivery of bytes to a PTY,
//! paste-then-submit (write, settle ~1s, write a carriage return).
//!
//! Grounded in `oj_core::timer::TimerId` plus the daemon's timer dispatch for
//! "a named, orderable delayed action fired once" — but same-terminal
//! ordering here is structural rather than reasoned-about: one
//! `tokio::sync::mpsc` queue per `TerminalId`, drained by a single task that
//! processes jobs strictly in arrival order, each waiting out its own
//! deadline before writing. Two jobs queued in submission order with
//! non-decreasing delays can never be delivered out of order.

use cso_pty::PtyMultiplexer;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use cso_core::TerminalId;

/// Settle time between writing a pasted payload and submitting it with Enter.
pub(crate) const SUBMIT_SETTLE: Duration = Duration::from_secs(1);

struct ScheduledJob {
    fire_at: Instant,
    payload: Vec<u8>,
}

pub struct Scheduler {
    pty: Arc<PtyMultiplexer>,
    queues: DashMap<TerminalId, mpsc::UnboundedSender<ScheduledJob>>,
}

impl Scheduler {
    pub fn new(pty: Arc<PtyMultiplexer>) -> Arc<Self> {
        Arc::new(Self { pty, queues: DashMap::new() })
    }

    /// Returns immediately; caller may disconnect before delivery (§4.7).
    pub fn schedule(self: &Arc<Self>, terminal_id: TerminalId, delay: Duration, payload: Vec<u8>) {
        let fire_at = Instant::now() + delay;
        let tx = self.queue_for(&terminal_id);
        let _ = tx.send(ScheduledJob { fire_at, payload });
    }

    fn queue_for(self: &Arc<Self>, terminal_id: &TerminalId) -> mpsc::UnboundedSender<ScheduledJob> {
        if let Some(tx) = self.queues.get(terminal_id) {
            return tx.clone();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.queues.insert(terminal_id.clone(), tx.clone());
        tokio::spawn(Self::drain(self.clone(), terminal_id.clone(), rx));
        tx
    }

    async fn drain(scheduler: Arc<Self>, terminal_id: TerminalId, mut rx: mpsc::UnboundedReceiver<ScheduledJob>) {
        while let Some(job) = rx.recv().await {
            tokio::time::sleep_until(job.fire_at).await;

            if let Err(e) = scheduler.pty.write(&terminal_id, &job.payload) {
                debug!(%terminal_id, error = %e, "scheduled write failed, terminal likely gone");
                continue;
            }

            tokio::time::sleep(SUBMIT_SETTLE).await;
            let _ = scheduler.pty.write(&terminal_id, b"\r");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
