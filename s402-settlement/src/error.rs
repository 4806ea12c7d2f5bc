//! Error taxonomy for the settlement engine.
//!
//! Every error exposes a stable `snake_case` code and a response category so
//! embedding transports can map failures without string matching.

use s402::amount::AmountError;
use s402::proto::{MalformedProofError, VerificationError};
use uuid::Uuid;

use crate::intent::IntentStatus;

/// Coarse response class an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller's input was rejected.
    InvalidInput,
    /// The referenced intent does not exist.
    NotFound,
    /// A chain backend refused or could not take the work.
    Backend,
    /// An internal invariant was violated.
    Internal,
}

/// Errors surfaced by the settlement engine's public operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SettlementError {
    /// The recipient is not a resolvable chain address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    /// The payment amount failed validation.
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
    /// No network is configured for the requested chain.
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),
    /// The referenced intent does not exist.
    #[error("Intent {0} not found")]
    IntentNotFound(Uuid),
    /// The submitted proof could not be decoded.
    #[error(transparent)]
    MalformedProof(#[from] MalformedProofError),
    /// The submitted proof failed verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),
    /// The intent is already in a terminal state.
    #[error("Intent {id} is in terminal state {status}")]
    TerminalState {
        /// The intent identifier.
        id: Uuid,
        /// The terminal status the intent is in.
        status: IntentStatus,
    },
    /// A state transition violated the intent lifecycle.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: IntentStatus,
        /// Requested status.
        to: IntentStatus,
    },
    /// A chain backend could not take the settlement.
    #[error("Chain adapter unavailable: {0}")]
    AdapterUnavailable(String),
    /// A chain backend rejected the settlement transaction.
    #[error("Chain adapter rejected settlement: {0}")]
    AdapterRejected(String),
    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SettlementError {
    /// Returns the stable `snake_case` code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRecipient(_) => "invalid_recipient",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::UnsupportedNetwork(_) => "unsupported_network",
            Self::IntentNotFound(_) => "intent_not_found",
            Self::MalformedProof(_) => "malformed_proof",
            Self::Verification(e) => e.reason().as_str(),
            Self::TerminalState { .. } => "terminal_state",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AdapterUnavailable(_) => "adapter_unavailable",
            Self::AdapterRejected(_) => "adapter_rejected",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the response category for this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRecipient(_)
            | Self::InvalidAmount(_)
            | Self::UnsupportedNetwork(_)
            | Self::MalformedProof(_)
            | Self::Verification(_)
            | Self::TerminalState { .. }
            | Self::InvalidTransition { .. } => ErrorCategory::InvalidInput,
            Self::IntentNotFound(_) => ErrorCategory::NotFound,
            Self::AdapterUnavailable(_) | Self::AdapterRejected(_) => ErrorCategory::Backend,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_categories() {
        let err = SettlementError::IntentNotFound(Uuid::nil());
        assert_eq!(err.code(), "intent_not_found");
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = SettlementError::Verification(VerificationError::NonceReplayed);
        assert_eq!(err.code(), "nonce_replayed");
        assert_eq!(err.category(), ErrorCategory::InvalidInput);

        let err = SettlementError::AdapterUnavailable("rpc down".into());
        assert_eq!(err.category(), ErrorCategory::Backend);
    }
}
