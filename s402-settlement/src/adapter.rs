//! The chain adapter seam.
//!
//! Everything that actually touches a blockchain lives behind
//! [`ChainAdapter`]. The engine never talks RPC itself; production
//! deployments plug in real submitters, tests plug in mocks.

use async_trait::async_trait;
use s402::chain::ChainId;

use crate::intent::SettlementRecord;
use crate::verify::VerifiedPayment;

/// Errors an adapter can surface to the engine.
///
/// The distinction matters: [`Unavailable`](AdapterError::Unavailable) is
/// retryable and leaves the intent re-drivable, while
/// [`Rejected`](AdapterError::Rejected) means the chain refused the
/// transaction itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// The chain backend could not be reached or could not take the work.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    /// The chain rejected the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

/// Capability trait over a single chain backend.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// The CAIP-2 chain this adapter settles on.
    fn chain_id(&self) -> ChainId;

    /// Executes a verified payment authorization on the source chain,
    /// securing the payer's funds.
    async fn settle_authorization(
        &self,
        payment: &VerifiedPayment,
    ) -> Result<SettlementRecord, AdapterError>;

    /// Transfers `amount_minor` units of `asset` to `to` on this chain.
    async fn transfer(
        &self,
        to: &str,
        amount_minor: u64,
        asset: &str,
    ) -> Result<SettlementRecord, AdapterError>;

    /// Returns `true` once the given transaction is confirmed.
    async fn confirmation_status(&self, tx_hash: &str) -> Result<bool, AdapterError>;
}
