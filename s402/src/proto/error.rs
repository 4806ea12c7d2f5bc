//! Error types for proof verification.
//!
//! This module defines the structured errors produced when a submitted proof
//! fails verification, along with machine-readable reason codes surfaced to
//! callers.

use serde::{Deserialize, Serialize};

/// Errors that can occur while verifying a settle proof against the frozen
/// payment requirements snapshot.
///
/// Every variant maps to a stable [`ErrorReason`] code; callers branch on the
/// code, humans read the message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VerificationError {
    /// The proof payload format is invalid or malformed.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// The accepted terms in the proof diverge from the stored snapshot.
    #[error("Accepted does not match the stored payment requirements")]
    RequirementsMismatch,
    /// The authorized amount is below the required amount.
    #[error("Payment amount is invalid with respect to the payment requirements")]
    AmountMismatch,
    /// The authorization's `validAfter` timestamp is in the future.
    #[error("Payment authorization is not yet valid")]
    Early,
    /// The authorization's `validBefore` timestamp has passed.
    #[error("Payment authorization is expired")]
    ExpiredWindow,
    /// The proof's chain doesn't match the requirements.
    #[error("Payment chain id is invalid with respect to the payment requirements")]
    ChainIdMismatch,
    /// The payment recipient doesn't match the requirements.
    #[error("Payment recipient is invalid with respect to the payment requirements")]
    RecipientMismatch,
    /// The payment asset (token/mint) doesn't match the requirements.
    #[error("Payment asset is invalid with respect to the payment requirements")]
    AssetMismatch,
    /// The payment signature is invalid.
    #[error("{0}")]
    SignatureInvalid(String),
    /// The authorization nonce has already been consumed.
    #[error("Authorization nonce already used")]
    NonceReplayed,
    /// The transaction's instruction set doesn't match the expected shape.
    #[error("{0}")]
    MalformedInstructions(String),
}

impl VerificationError {
    /// Returns the machine-readable reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidFormat(_) => ErrorReason::InvalidFormat,
            Self::RequirementsMismatch => ErrorReason::RequirementsMismatch,
            Self::AmountMismatch => ErrorReason::AmountMismatch,
            Self::Early => ErrorReason::InvalidPaymentEarly,
            Self::ExpiredWindow => ErrorReason::ExpiredWindow,
            Self::ChainIdMismatch => ErrorReason::ChainIdMismatch,
            Self::RecipientMismatch => ErrorReason::RecipientMismatch,
            Self::AssetMismatch => ErrorReason::AssetMismatch,
            Self::SignatureInvalid(_) => ErrorReason::SignatureInvalid,
            Self::NonceReplayed => ErrorReason::NonceReplayed,
            Self::MalformedInstructions(_) => ErrorReason::MalformedInstructions,
        }
    }
}

impl From<serde_json::Error> for VerificationError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidFormat(value.to_string())
    }
}

/// Machine-readable error reason codes for verification failures.
///
/// These codes are stored on failed intents and returned to callers so
/// clients can programmatically handle different failure scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// The proof payload format is invalid.
    InvalidFormat,
    /// The accepted terms diverge from the stored snapshot.
    RequirementsMismatch,
    /// The authorized amount is incorrect.
    AmountMismatch,
    /// The authorization is not yet valid.
    InvalidPaymentEarly,
    /// The authorization has expired.
    ExpiredWindow,
    /// The chain ID doesn't match.
    ChainIdMismatch,
    /// The recipient address doesn't match.
    RecipientMismatch,
    /// The asset doesn't match.
    AssetMismatch,
    /// The signature is invalid.
    SignatureInvalid,
    /// The nonce has already been consumed.
    NonceReplayed,
    /// The instruction set doesn't match the expected shape.
    MalformedInstructions,
    /// An unexpected error occurred.
    UnexpectedError,
}

impl ErrorReason {
    /// Returns the `snake_case` string representation matching the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::RequirementsMismatch => "requirements_mismatch",
            Self::AmountMismatch => "amount_mismatch",
            Self::InvalidPaymentEarly => "invalid_payment_early",
            Self::ExpiredWindow => "expired_window",
            Self::ChainIdMismatch => "chain_id_mismatch",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::AssetMismatch => "asset_mismatch",
            Self::SignatureInvalid => "signature_invalid",
            Self::NonceReplayed => "nonce_replayed",
            Self::MalformedInstructions => "malformed_instructions",
            Self::UnexpectedError => "unexpected_error",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ErrorReason::NonceReplayed).unwrap();
        assert_eq!(json, "\"nonce_replayed\"");
        assert_eq!(ErrorReason::NonceReplayed.as_str(), "nonce_replayed");
    }

    #[test]
    fn verification_errors_map_to_reasons() {
        assert_eq!(
            VerificationError::ExpiredWindow.reason(),
            ErrorReason::ExpiredWindow
        );
        assert_eq!(
            VerificationError::SignatureInvalid("bad".into()).reason(),
            ErrorReason::SignatureInvalid
        );
    }
}
