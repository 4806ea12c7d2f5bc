//! The embedding-facing settlement facade.
//!
//! [`SettlementService`] wires the store, nonce guard, orchestrator, and
//! reaper together from a [`SettlementConfig`] and a pair of chain adapters,
//! and exposes the three operations an embedding transport needs:
//! `create_intent`, `submit_proof`, and `intent_status`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use s402::amount::FeeSchedule;
use s402::chain::PayerChain;
use s402::networks::{NetworkInfo, NetworkRegistry};
use s402::proto::{U64String, UnixTimestamp};
use s402::proto::v2::{AssetMetadata, PaymentRequirements};
use s402_svm::VerifyLimits;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::adapter::ChainAdapter;
use crate::config::SettlementConfig;
use crate::error::SettlementError;
use crate::intent::{CreateIntentRequest, IntentStatus, PaymentIntent, validate_recipient};
use crate::orchestrator::{PayoutTarget, SettlementOrchestrator};
use crate::reaper::ExpiryReaper;
use crate::store::{IntentStore, NonceStore};

/// Resolved per-chain settlement parameters.
#[derive(Debug, Clone)]
struct ChainTarget {
    network: NetworkInfo,
    asset: String,
    pay_to: String,
    explorer_url: Option<String>,
}

/// The settlement engine behind one constructor and three operations.
#[derive(Debug)]
pub struct SettlementService {
    store: Arc<IntentStore>,
    orchestrator: SettlementOrchestrator,
    targets: HashMap<PayerChain, ChainTarget>,
    fee: FeeSchedule,
    intent_ttl_secs: u64,
    reaper_interval: Duration,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl SettlementService {
    /// Builds a service from configuration and one adapter per chain family.
    ///
    /// The adapters' chain IDs select the networks from the built-in
    /// registry; each selected network must have a `[chains."caip2"]` entry
    /// in the configuration providing the settlement address.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::UnsupportedNetwork`] if an adapter's chain
    /// is unknown or unconfigured.
    pub fn new(
        config: &SettlementConfig,
        base_adapter: Arc<dyn ChainAdapter>,
        solana_adapter: Arc<dyn ChainAdapter>,
    ) -> Result<Self, SettlementError> {
        let registry = NetworkRegistry::default();
        let mut targets = HashMap::new();
        for (payer_chain, adapter) in [
            (PayerChain::Base, &base_adapter),
            (PayerChain::Solana, &solana_adapter),
        ] {
            let chain_id = adapter.chain_id();
            let network = *registry
                .by_chain_id(&chain_id)
                .ok_or_else(|| SettlementError::UnsupportedNetwork(chain_id.to_string()))?;
            let chain_config = config
                .chains
                .get(&chain_id.to_string())
                .ok_or_else(|| SettlementError::UnsupportedNetwork(chain_id.to_string()))?;
            targets.insert(
                payer_chain,
                ChainTarget {
                    network,
                    asset: chain_config
                        .asset
                        .clone()
                        .unwrap_or_else(|| network.usdc.address.to_owned()),
                    pay_to: chain_config.pay_to.clone(),
                    explorer_url: chain_config.explorer_url.clone(),
                },
            );
        }

        let base_target = targets
            .get(&PayerChain::Base)
            .ok_or_else(|| SettlementError::Internal("missing base target".to_owned()))?;
        let payout = PayoutTarget {
            asset: base_target.asset.clone(),
            decimals: base_target.network.usdc.decimals,
        };

        let store = Arc::new(IntentStore::new());
        let nonces = Arc::new(NonceStore::new());
        let adapters: HashMap<PayerChain, Arc<dyn ChainAdapter>> = HashMap::from([
            (PayerChain::Base, Arc::clone(&base_adapter)),
            (PayerChain::Solana, solana_adapter),
        ]);
        let orchestrator = SettlementOrchestrator::new(
            Arc::clone(&store),
            nonces,
            adapters,
            base_adapter,
            payout,
            config.payout_retry,
            VerifyLimits::default(),
        );

        Ok(Self {
            store,
            orchestrator,
            targets,
            fee: config.fee.into(),
            intent_ttl_secs: config.intent_ttl_secs,
            reaper_interval: Duration::from_secs(config.reaper_interval_secs),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Starts the background expiry reaper.
    pub fn start(&self) {
        ExpiryReaper::new(Arc::clone(&self.store), self.reaper_interval)
            .spawn(&self.tracker, self.cancel.child_token());
    }

    /// Stops background tasks and waits for in-flight payouts to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        self.orchestrator.shutdown().await;
    }

    /// Creates a payment intent with a frozen fee quote and requirements
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError`] if the recipient is not a chain address,
    /// the amount cannot be represented in the token's minor units, or the
    /// payer chain is not configured.
    pub fn create_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<PaymentIntent, SettlementError> {
        validate_recipient(&request.recipient)?;
        let target = self
            .targets
            .get(&request.payer_chain)
            .ok_or_else(|| SettlementError::UnsupportedNetwork(request.payer_chain.to_string()))?;

        let decimals = target.network.usdc.decimals;
        let amount_minor = request.sending_amount.to_minor_units(decimals)?;
        let estimated_fee = self.fee.fee_for(&request.sending_amount, decimals);
        let receiving_amount = request.sending_amount.inner() - estimated_fee;
        let now = UnixTimestamp::now();

        let extra = match request.payer_chain {
            PayerChain::Base => Some(AssetMetadata {
                name: target.network.usdc.eip712_name.to_owned(),
                version: target.network.usdc.eip712_version.to_owned(),
            }),
            PayerChain::Solana => None,
        };
        let requirements = PaymentRequirements {
            scheme: "exact".to_owned(),
            network: target.network.chain_id(),
            asset: target.asset.clone(),
            amount: U64String::from(amount_minor),
            pay_to: target.pay_to.clone(),
            max_timeout_seconds: self.intent_ttl_secs,
            extra,
        };

        let intent = PaymentIntent {
            id: Uuid::new_v4(),
            recipient: request.recipient.clone(),
            payer_chain: request.payer_chain,
            sending_amount: request.sending_amount,
            estimated_fee,
            receiving_amount,
            status: IntentStatus::AwaitingPayment,
            created_at: now,
            expires_at: now + self.intent_ttl_secs,
            requirements,
            payer: None,
            failure_reason: None,
            nonce: None,
            in_flight: 0,
            source_settlement: None,
            base_settlement: None,
            completed_at: None,
            needs_attention: false,
        };
        self.store.insert(intent.clone())?;
        tracing::info!(
            intent = %intent.id,
            payer_chain = %request.payer_chain,
            amount = %request.sending_amount,
            "Intent created"
        );
        Ok(intent)
    }

    /// Submits a base64-encoded settle proof for an intent.
    ///
    /// # Errors
    ///
    /// See [`SettlementOrchestrator::submit_proof`].
    pub async fn submit_proof(
        &self,
        id: Uuid,
        encoded: &str,
    ) -> Result<PaymentIntent, SettlementError> {
        self.orchestrator.submit_proof(id, encoded).await
    }

    /// Returns a point-in-time snapshot of an intent.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::IntentNotFound`] if the id is unknown.
    pub async fn intent_status(&self, id: Uuid) -> Result<PaymentIntent, SettlementError> {
        self.store.snapshot(&id).await
    }

    /// Returns the explorer URL prefix configured for a chain family.
    #[must_use]
    pub fn explorer_url(&self, payer_chain: PayerChain) -> Option<&str> {
        self.targets
            .get(&payer_chain)
            .and_then(|target| target.explorer_url.as_deref())
    }
}
