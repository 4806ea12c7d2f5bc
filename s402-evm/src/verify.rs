//! Proof verification logic for the EIP-155 exact scheme.
//!
//! Contains precondition checks (recipient, time window, value) and the
//! composite [`verify_payment`] function that reconstructs the EIP-712 typed
//! data from the frozen requirements snapshot and recovers the signer
//! locally.

use std::str::FromStr;

use alloy_primitives::{Address, B256, Signature, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};
use s402::proto::v2::PaymentRequirements;
use s402::proto::{UnixTimestamp, VerificationError};

use crate::error::Eip155ExactError;
use crate::types::{Eip3009Payload, TransferWithAuthorization};

/// Grace buffer, in seconds, applied to the expiry check to account for
/// clock skew and settlement latency.
const EXPIRY_GRACE_SECS: u64 = 6;

/// Result of a successful EIP-3009 verification.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedTransfer {
    /// The recovered payer address.
    pub payer: Address,
    /// The transfer recipient.
    pub to: Address,
    /// The authorized value in minor units.
    pub value: U256,
    /// The one-time authorization nonce.
    pub nonce: B256,
}

/// Deserializes the chain-specific payload from the proof envelope.
///
/// # Errors
///
/// Returns [`VerificationError::InvalidFormat`] if the payload is not an
/// EIP-3009 payload.
pub fn decode_payload(payload: &serde_json::Value) -> Result<Eip3009Payload, VerificationError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| Eip155ExactError::PayloadDecoding(e.to_string()).into())
}

/// Validates that `now` is within the `validAfter` and `validBefore` bounds.
///
/// Adds a grace buffer when checking expiration to account for latency.
///
/// # Errors
///
/// Returns [`VerificationError::ExpiredWindow`] or [`VerificationError::Early`].
pub fn assert_time(
    valid_after: UnixTimestamp,
    valid_before: UnixTimestamp,
    now: UnixTimestamp,
) -> Result<(), VerificationError> {
    if valid_before < now + EXPIRY_GRACE_SECS {
        return Err(VerificationError::ExpiredWindow);
    }
    if valid_after > now {
        return Err(VerificationError::Early);
    }
    Ok(())
}

/// Constructs the EIP-712 domain for signature verification from the frozen
/// requirements snapshot.
///
/// The domain fields (`name`, `version`, `chainId`, `verifyingContract`) all
/// come from the snapshot; verification never queries the chain.
///
/// # Errors
///
/// Returns [`Eip155ExactError`] if the snapshot carries an invalid asset
/// address, a non-numeric chain reference, or no EIP-712 metadata.
pub fn build_domain(requirements: &PaymentRequirements) -> Result<Eip712Domain, Eip155ExactError> {
    let asset = Address::from_str(&requirements.asset)
        .map_err(|_| Eip155ExactError::InvalidAssetAddress(requirements.asset.clone()))?;
    let chain_ref = requirements.network.reference();
    let chain_id: u64 = chain_ref
        .parse()
        .map_err(|_| Eip155ExactError::InvalidChainReference(chain_ref.to_owned()))?;
    let extra = requirements
        .extra
        .as_ref()
        .ok_or(Eip155ExactError::MissingDomainMetadata)?;

    let domain = eip712_domain! {
        name: extra.name.clone(),
        version: extra.version.clone(),
        chain_id: chain_id,
        verifying_contract: asset,
    };
    Ok(domain)
}

/// Runs all preconditions and verifies the EIP-712 signature of an EIP-3009
/// payload against the frozen requirements snapshot.
///
/// Checks, in order: chain namespace, recipient, validity window, authorized
/// value, and finally that the signature recovers to the claimed payer
/// (`authorization.from`).
///
/// # Errors
///
/// Returns a [`VerificationError`] naming the first failed check.
pub fn verify_payment(
    requirements: &PaymentRequirements,
    payload: &Eip3009Payload,
    now: UnixTimestamp,
) -> Result<VerifiedTransfer, VerificationError> {
    if requirements.network.namespace() != "eip155" {
        return Err(VerificationError::ChainIdMismatch);
    }

    let authorization = &payload.authorization;
    let pay_to = Address::from_str(&requirements.pay_to)
        .map_err(|_| Eip155ExactError::InvalidPayToAddress(requirements.pay_to.clone()))?;
    if authorization.to != pay_to {
        return Err(VerificationError::RecipientMismatch);
    }

    assert_time(authorization.valid_after, authorization.valid_before, now)?;

    let required = U256::from(requirements.amount());
    if authorization.value.inner() < required {
        return Err(VerificationError::AmountMismatch);
    }

    let domain = build_domain(requirements)?;
    let message = TransferWithAuthorization::from(authorization);
    let hash = message.eip712_signing_hash(&domain);

    let signature = Signature::from_raw(payload.signature.as_ref())
        .map_err(|e| Eip155ExactError::MalformedSignature(e.to_string()))?;
    let recovered = signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| VerificationError::SignatureInvalid(format!("recovery failed: {e}")))?;

    if recovered != authorization.from {
        return Err(VerificationError::SignatureInvalid(
            "signature does not recover to the claimed payer".to_owned(),
        ));
    }
    #[cfg(feature = "telemetry")]
    tracing::debug!(payer = %recovered, "Recovered authorization signer");

    Ok(VerifiedTransfer {
        payer: recovered,
        to: authorization.to,
        value: authorization.value.inner(),
        nonce: authorization.nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Eip3009Authorization, TokenAmount};
    use alloy_primitives::{Bytes, b256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use s402::proto::U64String;
    use s402::proto::v2::AssetMetadata;

    const USDC_BASE: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
    const PAY_TO: &str = "0x2222222222222222222222222222222222222222";

    fn requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".into(),
            network: "eip155:8453".parse().unwrap(),
            asset: USDC_BASE.into(),
            amount: U64String::from(10_000_000),
            pay_to: PAY_TO.into(),
            max_timeout_seconds: 600,
            extra: Some(AssetMetadata {
                name: "USD Coin".into(),
                version: "2".into(),
            }),
        }
    }

    fn signed_payload(
        signer: &PrivateKeySigner,
        requirements: &PaymentRequirements,
        value: u64,
        valid_after: u64,
        valid_before: u64,
    ) -> Eip3009Payload {
        let authorization = Eip3009Authorization {
            from: signer.address(),
            to: Address::from_str(PAY_TO).unwrap(),
            value: TokenAmount::from(value),
            valid_after: UnixTimestamp::from_secs(valid_after),
            valid_before: UnixTimestamp::from_secs(valid_before),
            nonce: b256!("0x0000000000000000000000000000000000000000000000000000000000000001"),
        };
        let domain = build_domain(requirements).unwrap();
        let hash = TransferWithAuthorization::from(&authorization).eip712_signing_hash(&domain);
        let signature = signer.sign_hash_sync(&hash).unwrap();
        Eip3009Payload {
            signature: Bytes::from(signature.as_bytes().to_vec()),
            authorization,
        }
    }

    #[test]
    fn valid_signature_recovers_to_payer() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let payload = signed_payload(&signer, &reqs, 10_000_000, 0, 1_999_999_999);

        let verified = verify_payment(&reqs, &payload, now).unwrap();
        assert_eq!(verified.payer, signer.address());
        assert_eq!(verified.value, U256::from(10_000_000u64));
    }

    #[test]
    fn claimed_payer_mismatch_is_rejected() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let mut payload = signed_payload(&signer, &reqs, 10_000_000, 0, 1_999_999_999);
        payload.authorization.from = Address::from_str(PAY_TO).unwrap();

        // The authorization changed after signing, so recovery yields a
        // different address than the claimed payer.
        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureInvalid(_)));
    }

    #[test]
    fn expired_valid_before_is_rejected() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let payload = signed_payload(&signer, &reqs, 10_000_000, 0, 1_600_000_000);

        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::ExpiredWindow));
    }

    #[test]
    fn future_valid_after_is_rejected() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let payload = signed_payload(&signer, &reqs, 10_000_000, 1_800_000_000, 1_999_999_999);

        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::Early));
    }

    #[test]
    fn insufficient_value_is_rejected() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let payload = signed_payload(&signer, &reqs, 9_000_000, 0, 1_999_999_999);

        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::AmountMismatch));
    }

    #[test]
    fn wrong_recipient_is_rejected() {
        let signer = PrivateKeySigner::random();
        let reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let mut payload = signed_payload(&signer, &reqs, 10_000_000, 0, 1_999_999_999);
        payload.authorization.to =
            Address::from_str("0x3333333333333333333333333333333333333333").unwrap();

        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::RecipientMismatch));
    }

    #[test]
    fn missing_domain_metadata_is_rejected() {
        let signer = PrivateKeySigner::random();
        let mut reqs = requirements();
        let now = UnixTimestamp::from_secs(1_700_000_000);
        let payload = signed_payload(&signer, &reqs, 10_000_000, 0, 1_999_999_999);
        reqs.extra = None;

        let err = verify_payment(&reqs, &payload, now).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureInvalid(_)));
    }
}
