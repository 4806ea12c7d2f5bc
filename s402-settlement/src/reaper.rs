//! Background expiry sweep.
//!
//! Intents that never received a valid proof are moved to `EXPIRED` by a
//! periodic task. The sweep goes through the same guarded transition as
//! everything else, so a concurrent proof submission and a sweep race on one
//! intent resolve to exactly one winner.

use std::sync::Arc;
use std::time::Duration;

use s402::proto::{ErrorReason, UnixTimestamp};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::intent::IntentStatus;
use crate::store::IntentStore;

/// Periodically sweeps funding-phase intents past their deadline.
#[derive(Debug)]
pub struct ExpiryReaper {
    store: Arc<IntentStore>,
    interval: Duration,
}

impl ExpiryReaper {
    /// Creates a reaper over the given store.
    #[must_use]
    pub const fn new(store: Arc<IntentStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Spawns the sweep loop on the given tracker.
    ///
    /// The loop runs until the cancellation token fires; one final sweep is
    /// not attempted on shutdown.
    pub fn spawn(self, tracker: &TaskTracker, cancel: CancellationToken) {
        tracker.spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep(UnixTimestamp::now()).await;
                    }
                }
            }
            tracing::debug!("Expiry reaper stopped");
        });
    }

    /// Runs one sweep: every idle `AWAITING_PAYMENT` or `PENDING` intent
    /// strictly past its deadline moves to `EXPIRED`. Intents with a
    /// settlement drive in flight are skipped; expiry only abandons proofs
    /// that are not being driven. Idempotent on already-terminal intents.
    pub async fn sweep(&self, now: UnixTimestamp) {
        for handle in self.store.all() {
            let mut intent = handle.lock().await;
            let in_funding_phase = matches!(
                intent.status,
                IntentStatus::AwaitingPayment | IntentStatus::Pending
            );
            if in_funding_phase
                && intent.in_flight == 0
                && intent.is_past_expiry(now)
                && intent.transition(IntentStatus::Expired).is_ok()
            {
                intent.failure_reason = Some(ErrorReason::ExpiredWindow);
                tracing::debug!(intent = %intent.id, "Intent expired");
            }
        }
    }
}
