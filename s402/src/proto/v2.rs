//! V2 settlement wire types.
//!
//! These types use CAIP-2 network identifiers and structured payment
//! requirements. The requirements snapshot frozen into an intent at creation
//! is the authoritative contract every proof is checked against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::U64String;
use crate::chain::ChainId;

/// Version tag carried by every v2 proof envelope.
pub const X402_VERSION: u32 = 2;

/// Describes the resource or payment the proof relates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// The URL or URI of the resource.
    pub url: String,

    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// EIP-712 domain metadata for the asset, carried in `extra`.
///
/// EVM stablecoins sign `TransferWithAuthorization` under a token-specific
/// domain; the name and version are frozen into the requirements snapshot so
/// verification never needs an on-chain query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    /// EIP-712 domain name (e.g., "USD Coin").
    pub name: String,
    /// EIP-712 domain version (e.g., "2").
    pub version: String,
}

/// V2 payment requirements structure.
///
/// Defines what the settlement core requires for payment: scheme, network,
/// asset, amount, recipient, and timeout. Frozen into the intent at creation
/// and immutable afterwards.
///
/// # JSON Format
///
/// ```json
/// {
///   "scheme": "exact",
///   "network": "eip155:8453",
///   "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
///   "amount": "10000000",
///   "payTo": "0x...",
///   "maxTimeoutSeconds": 600,
///   "extra": { "name": "USD Coin", "version": "2" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (always "exact" for this core).
    pub scheme: String,

    /// CAIP-2 network identifier (e.g., "eip155:8453").
    pub network: ChainId,

    /// Asset address/identifier (e.g., USDC contract or mint address).
    pub asset: String,

    /// Amount in smallest unit (e.g., "1000000" for 1 USDC).
    pub amount: U64String,

    /// Recipient settlement address.
    pub pay_to: String,

    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,

    /// EIP-712 domain metadata for EVM assets; absent for Solana.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<AssetMetadata>,
}

impl PaymentRequirements {
    /// Returns the required amount in minor units.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount.inner()
    }
}

/// A decoded settle proof: the X402 v2 payment payload envelope.
///
/// Transient by design: the proof is decoded, checked against the stored
/// requirements snapshot, verified cryptographically, and discarded. It is
/// never persisted beyond verification.
///
/// # JSON Format
///
/// ```json
/// {
///   "x402Version": 2,
///   "payload": { "authorization": {...}, "signature": "0x..." },
///   "accepted": { "scheme": "exact", "network": "eip155:8453", ... },
///   "resource": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleProof {
    /// Protocol version (always 2).
    pub x402_version: u32,

    /// Chain-specific signed payload data.
    pub payload: Value,

    /// The payment requirements the payer accepted, copied for comparison
    /// against the stored snapshot.
    pub accepted: PaymentRequirements,

    /// Optional resource information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
}

impl SettleProof {
    /// Returns the payment scheme from the accepted requirements.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.accepted.scheme
    }

    /// Returns the network from the accepted requirements.
    #[must_use]
    pub const fn network(&self) -> &ChainId {
        &self.accepted.network
    }
}
