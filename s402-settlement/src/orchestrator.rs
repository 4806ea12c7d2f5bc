//! The settlement orchestrator: proof intake, source-chain settlement, and
//! the Base payout leg.
//!
//! `submit_proof` drives an intent through
//! `AWAITING_PAYMENT → PENDING → SOURCE_SETTLED` inline, then spawns the
//! payout task that carries it through `BASE_SETTLING → BASE_SETTLED`.
//! Intent locks are held only for state reads and writes; verification and
//! every adapter call happen outside the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use s402::chain::PayerChain;
use s402::proto::{ErrorReason, UnixTimestamp, VerificationError, decode_proof};
use s402_svm::VerifyLimits;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::adapter::{AdapterError, ChainAdapter};
use crate::config::RetryConfig;
use crate::error::SettlementError;
use crate::intent::{IntentStatus, PaymentIntent};
use crate::store::{IntentStore, NonceKey, NonceStore};
use crate::verify::{extract_nonce, verify_proof};

/// Where payouts land: the Base-side asset and its decimal precision.
#[derive(Debug, Clone)]
pub struct PayoutTarget {
    /// Asset contract address transferred to the merchant.
    pub asset: String,
    /// Token decimals used to scale the receiving amount.
    pub decimals: u32,
}

/// Drives intents through the settlement state machine.
pub struct SettlementOrchestrator {
    store: Arc<IntentStore>,
    nonces: Arc<NonceStore>,
    adapters: HashMap<PayerChain, Arc<dyn ChainAdapter>>,
    payout_adapter: Arc<dyn ChainAdapter>,
    payout: PayoutTarget,
    retry: RetryConfig,
    limits: VerifyLimits,
    tracker: TaskTracker,
}

impl fmt::Debug for SettlementOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementOrchestrator")
            .field("payout", &self.payout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SettlementOrchestrator {
    /// Creates an orchestrator over the given store and chain adapters.
    #[must_use]
    pub fn new(
        store: Arc<IntentStore>,
        nonces: Arc<NonceStore>,
        adapters: HashMap<PayerChain, Arc<dyn ChainAdapter>>,
        payout_adapter: Arc<dyn ChainAdapter>,
        payout: PayoutTarget,
        retry: RetryConfig,
        limits: VerifyLimits,
    ) -> Self {
        Self {
            store,
            nonces,
            adapters,
            payout_adapter,
            payout,
            retry,
            limits,
            tracker: TaskTracker::new(),
        }
    }

    /// Submits a base64-encoded settle proof for an intent.
    ///
    /// On success the intent has reached `SOURCE_SETTLED` and the payout task
    /// is in flight; the returned snapshot reflects that state. A proof for
    /// an intent that already settled is a no-op returning the current state,
    /// unless the proof's replay key matches the one this intent consumed.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError`] describing the failed stage: decoding,
    /// terminal state, verification, nonce replay, or source-chain
    /// settlement. A source adapter outage leaves the intent in `PENDING` so
    /// the proof can be re-driven.
    pub async fn submit_proof(
        &self,
        id: Uuid,
        encoded: &str,
    ) -> Result<PaymentIntent, SettlementError> {
        let handle = self
            .store
            .get(&id)
            .ok_or(SettlementError::IntentNotFound(id))?;
        let proof = decode_proof(encoded)?;
        let now = UnixTimestamp::now();

        // Stage 1, under the intent lock: state gate, expiry boundary, and
        // the accepted-vs-snapshot comparison.
        let payer_chain = {
            let mut intent = handle.lock().await;
            match intent.status {
                IntentStatus::SourceSettled
                | IntentStatus::BaseSettling
                | IntentStatus::BaseSettled => {
                    let replayed = extract_nonce(intent.payer_chain, &proof.payload)
                        .is_some_and(|nonce| intent.nonce.as_deref() == Some(nonce.as_str()));
                    if replayed {
                        return Err(VerificationError::NonceReplayed.into());
                    }
                    return Ok(intent.clone());
                }
                IntentStatus::VerificationFailed | IntentStatus::Expired => {
                    return Err(SettlementError::TerminalState {
                        id,
                        status: intent.status,
                    });
                }
                IntentStatus::AwaitingPayment | IntentStatus::Pending => {
                    if intent.is_past_expiry(now) {
                        intent.transition(IntentStatus::Expired)?;
                        intent.failure_reason = Some(ErrorReason::ExpiredWindow);
                        return Err(SettlementError::TerminalState {
                            id,
                            status: IntentStatus::Expired,
                        });
                    }
                    if proof.accepted != intent.requirements {
                        intent.transition(IntentStatus::VerificationFailed)?;
                        intent.failure_reason = Some(ErrorReason::RequirementsMismatch);
                        return Err(VerificationError::RequirementsMismatch.into());
                    }
                    if intent.status == IntentStatus::AwaitingPayment {
                        intent.transition(IntentStatus::Pending)?;
                    }
                    // Marked before the lock is released: the expiry sweep
                    // must not abandon an intent whose settlement drive is
                    // between here and the source-chain result.
                    intent.in_flight += 1;
                    intent.payer_chain
                }
            }
        };

        // Stage 2, outside the lock: chain-specific verification.
        let verified = match verify_proof(payer_chain, &proof, now, &self.limits) {
            Ok(verified) => verified,
            Err(e) => {
                let reason = e.reason();
                let mut intent = handle.lock().await;
                intent.in_flight = intent.in_flight.saturating_sub(1);
                if intent.status == IntentStatus::Pending {
                    intent.transition(IntentStatus::VerificationFailed)?;
                    intent.failure_reason = Some(reason);
                }
                tracing::warn!(intent = %id, reason = %reason, "Proof verification failed");
                return Err(e.into());
            }
        };

        // Stage 3: atomic nonce claim, first claim wins.
        let key = NonceKey {
            asset: verified.asset.clone(),
            chain: verified.chain.clone(),
            nonce: verified.nonce.clone(),
        };
        if let Err(owner) = self.nonces.claim(key.clone(), id) {
            let mut intent = handle.lock().await;
            intent.in_flight = intent.in_flight.saturating_sub(1);
            if owner != id && intent.status == IntentStatus::Pending {
                intent.transition(IntentStatus::VerificationFailed)?;
                intent.failure_reason = Some(ErrorReason::NonceReplayed);
            }
            drop(intent);
            tracing::warn!(intent = %id, owner = %owner, "Replayed authorization nonce");
            return Err(VerificationError::NonceReplayed.into());
        }

        // Stage 4: secure the payer's funds on the source chain.
        let Some(adapter) = self.adapters.get(&payer_chain) else {
            self.nonces.release(&key, id);
            let mut intent = handle.lock().await;
            intent.in_flight = intent.in_flight.saturating_sub(1);
            return Err(SettlementError::Internal(format!(
                "no adapter for {payer_chain}"
            )));
        };
        match adapter.settle_authorization(&verified).await {
            Ok(record) => {
                let snapshot = {
                    let mut intent = handle.lock().await;
                    intent.in_flight = intent.in_flight.saturating_sub(1);
                    intent.payer = Some(verified.payer.clone());
                    intent.nonce = Some(verified.nonce.clone());
                    intent.source_settlement = Some(record);
                    if let Err(e) = intent.transition(IntentStatus::SourceSettled) {
                        // Funds are already committed on the source chain:
                        // keep the settlement record and flag the intent
                        // rather than losing either.
                        intent.needs_attention = true;
                        tracing::error!(
                            intent = %id,
                            error = %e,
                            "Source settled outside the funding phase"
                        );
                        return Err(e);
                    }
                    intent.clone()
                };
                tracing::info!(intent = %id, payer = %verified.payer, "Source chain settled");
                self.spawn_payout(id);
                Ok(snapshot)
            }
            Err(AdapterError::Unavailable(msg)) => {
                // Release the claim so a re-submitted proof can re-drive
                // settlement from PENDING.
                self.nonces.release(&key, id);
                {
                    let mut intent = handle.lock().await;
                    intent.in_flight = intent.in_flight.saturating_sub(1);
                }
                tracing::warn!(intent = %id, error = %msg, "Source adapter unavailable");
                Err(SettlementError::AdapterUnavailable(msg))
            }
            Err(AdapterError::Rejected(msg)) => {
                self.nonces.release(&key, id);
                let mut intent = handle.lock().await;
                intent.in_flight = intent.in_flight.saturating_sub(1);
                if intent.status == IntentStatus::Pending {
                    intent.transition(IntentStatus::VerificationFailed)?;
                    intent.failure_reason = Some(ErrorReason::UnexpectedError);
                }
                tracing::warn!(intent = %id, error = %msg, "Source chain rejected settlement");
                Err(SettlementError::AdapterRejected(msg))
            }
        }
    }

    /// Closes the task tracker and waits for in-flight payout tasks.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn_payout(&self, id: Uuid) {
        let store = Arc::clone(&self.store);
        let adapter = Arc::clone(&self.payout_adapter);
        let payout = self.payout.clone();
        let retry = self.retry;
        self.tracker.spawn(async move {
            run_payout(&store, adapter.as_ref(), &payout, retry, id).await;
        });
    }
}

/// The payout leg: `SOURCE_SETTLED → BASE_SETTLING → BASE_SETTLED`.
///
/// Transfer failures back off exponentially up to the retry budget. After
/// exhaustion the intent stays in `BASE_SETTLING` with `needs_attention` set;
/// there is no rollback path once the payer's funds are secured.
async fn run_payout(
    store: &IntentStore,
    adapter: &dyn ChainAdapter,
    payout: &PayoutTarget,
    retry: RetryConfig,
    id: Uuid,
) {
    let Some(handle) = store.get(&id) else {
        return;
    };

    let (recipient, amount_minor) = {
        let mut intent = handle.lock().await;
        if let Err(e) = intent.transition(IntentStatus::BaseSettling) {
            tracing::error!(intent = %id, error = %e, "Can not start payout");
            return;
        }
        let scaled = intent.receiving_amount * Decimal::from(10u64.pow(payout.decimals));
        let Some(minor) = scaled.trunc().to_u64() else {
            intent.needs_attention = true;
            tracing::error!(intent = %id, "Receiving amount does not fit in minor units");
            return;
        };
        (intent.recipient.clone(), minor)
    };

    let mut delay = retry.base_delay_ms;
    for attempt in 1..=retry.max_attempts {
        match adapter.transfer(&recipient, amount_minor, &payout.asset).await {
            Ok(record) => {
                if await_confirmation(adapter, &record.tx_hash, retry).await {
                    let mut intent = handle.lock().await;
                    match intent.transition(IntentStatus::BaseSettled) {
                        Ok(()) => {
                            intent.base_settlement = Some(record);
                            intent.completed_at = Some(UnixTimestamp::now());
                            tracing::info!(intent = %id, "Payout settled");
                        }
                        Err(e) => {
                            tracing::error!(intent = %id, error = %e, "Can not record payout");
                        }
                    }
                } else {
                    let mut intent = handle.lock().await;
                    intent.base_settlement = Some(record);
                    intent.needs_attention = true;
                    tracing::error!(intent = %id, "Payout confirmation not observed");
                }
                return;
            }
            Err(e) => {
                tracing::warn!(intent = %id, attempt, error = %e, "Payout transfer failed");
                if attempt < retry.max_attempts {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(retry.max_delay_ms);
                }
            }
        }
    }

    let mut intent = handle.lock().await;
    intent.needs_attention = true;
    tracing::error!(
        intent = %id,
        attempts = retry.max_attempts,
        "Payout retries exhausted; intent stays BASE_SETTLING"
    );
}

/// Polls the adapter until the transaction confirms or the budget runs out.
async fn await_confirmation(adapter: &dyn ChainAdapter, tx_hash: &str, retry: RetryConfig) -> bool {
    let mut delay = retry.base_delay_ms;
    for _ in 0..retry.max_attempts {
        match adapter.confirmation_status(tx_hash).await {
            Ok(true) => return true,
            Ok(false) | Err(_) => {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay = (delay * 2).min(retry.max_delay_ms);
            }
        }
    }
    false
}
