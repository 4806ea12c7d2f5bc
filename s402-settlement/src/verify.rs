//! Chain dispatch for proof verification.
//!
//! Pure functions: the proof and the frozen requirements snapshot go in, a
//! [`VerifiedPayment`] or a [`VerificationError`] comes out. No store access,
//! no adapter calls.

use s402::chain::{ChainId, PayerChain};
use s402::proto::v2::SettleProof;
use s402::proto::{Base64Bytes, UnixTimestamp, VerificationError};
use s402_svm::VerifyLimits;
use solana_transaction::versioned::VersionedTransaction;

/// The outcome of successful verification, normalized across chains.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    /// Payer address (0x-hex or base58).
    pub payer: String,
    /// Authorized amount in minor units.
    pub amount_minor: u64,
    /// Chain-specific replay key (EIP-3009 nonce or transaction signature).
    pub nonce: String,
    /// The chain the authorization targets.
    pub chain: ChainId,
    /// The asset being transferred.
    pub asset: String,
}

/// Verifies a decoded proof against the frozen requirements snapshot,
/// dispatching on the payer's chain family.
///
/// # Errors
///
/// Returns a [`VerificationError`] naming the first failed check.
pub fn verify_proof(
    payer_chain: PayerChain,
    proof: &SettleProof,
    now: UnixTimestamp,
    limits: &VerifyLimits,
) -> Result<VerifiedPayment, VerificationError> {
    let requirements = &proof.accepted;
    if !payer_chain.matches(&requirements.network) {
        return Err(VerificationError::ChainIdMismatch);
    }

    match payer_chain {
        PayerChain::Base => {
            let payload = s402_evm::verify::decode_payload(&proof.payload)?;
            let verified = s402_evm::verify_payment(requirements, &payload, now)?;
            Ok(VerifiedPayment {
                payer: verified.payer.to_string(),
                amount_minor: u64::try_from(verified.value).unwrap_or(u64::MAX),
                nonce: verified.nonce.to_string(),
                chain: requirements.network.clone(),
                asset: requirements.asset.clone(),
            })
        }
        PayerChain::Solana => {
            let payload = s402_svm::verify::decode_payload(&proof.payload)?;
            let verified = s402_svm::verify_payment(requirements, &payload, limits)?;
            Ok(VerifiedPayment {
                payer: verified.payer.to_string(),
                amount_minor: verified.amount,
                nonce: verified.signature.to_string(),
                chain: requirements.network.clone(),
                asset: requirements.asset.clone(),
            })
        }
    }
}

/// Extracts the replay key from a proof payload without verifying it.
///
/// Used to recognize a re-submitted proof against an already-settled intent.
/// Structural only; a payload that does not parse simply yields `None`.
#[must_use]
pub fn extract_nonce(payer_chain: PayerChain, payload: &serde_json::Value) -> Option<String> {
    match payer_chain {
        PayerChain::Base => payload
            .get("authorization")
            .and_then(|auth| auth.get("nonce"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_lowercase),
        PayerChain::Solana => {
            let encoded = payload.get("transaction").and_then(serde_json::Value::as_str)?;
            let bytes = Base64Bytes::from(encoded.as_bytes()).decode().ok()?;
            let transaction = bincode::deserialize::<VersionedTransaction>(&bytes).ok()?;
            transaction.signatures.first().map(ToString::to_string)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn evm_nonce_extraction_is_structural() {
        let payload = json!({
            "signature": "0x11",
            "authorization": {
                "nonce": "0x00000000000000000000000000000000000000000000000000000000000000AB"
            }
        });
        let nonce = extract_nonce(PayerChain::Base, &payload).unwrap();
        assert_eq!(
            nonce,
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        );
    }

    #[test]
    fn garbage_payload_yields_no_nonce() {
        assert!(extract_nonce(PayerChain::Base, &json!({})).is_none());
        assert!(extract_nonce(PayerChain::Solana, &json!({"transaction": "!!"})).is_none());
    }
}
