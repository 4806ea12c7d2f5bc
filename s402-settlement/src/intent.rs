//! The payment intent model and its state machine.
//!
//! An intent is created when a merchant requests payment and only ever moves
//! forward: `AWAITING_PAYMENT → PENDING → SOURCE_SETTLED → BASE_SETTLING →
//! BASE_SETTLED`, with `VERIFICATION_FAILED` and `EXPIRED` reachable only
//! before any funds have moved. Transition legality is enforced in exactly
//! one place, [`PaymentIntent::transition`]; intents are never deleted.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use s402::amount::Amount;
use s402::chain::{ChainId, PayerChain};
use s402::proto::v2::PaymentRequirements;
use s402::proto::{ErrorReason, UnixTimestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SettlementError;

static EVM_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Invalid EVM address regex"));

static BASE58_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("Invalid base58 address regex")
});

/// Lifecycle status of a payment intent.
///
/// Serialized in `SCREAMING_SNAKE_CASE` on the wire (`"AWAITING_PAYMENT"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Created, no proof seen yet.
    AwaitingPayment,
    /// A proof arrived and passed structural checks; verification in flight.
    Pending,
    /// Funds secured on the payer's source chain.
    SourceSettled,
    /// Payout to the merchant on Base is in flight.
    BaseSettling,
    /// Payout confirmed. Terminal.
    BaseSettled,
    /// Proof verification failed. Terminal.
    VerificationFailed,
    /// The intent expired before funds were secured. Terminal.
    Expired,
}

impl IntentStatus {
    /// Returns `true` for states no intent ever leaves.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::BaseSettled | Self::VerificationFailed | Self::Expired
        )
    }

    /// Returns `true` if funds have been secured on the source chain.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::SourceSettled | Self::BaseSettling | Self::BaseSettled
        )
    }

    /// Returns `true` if `next` is a legal successor of this status.
    ///
    /// The failure terminals are reachable only before any funds have moved;
    /// once `SOURCE_SETTLED` is reached there is no path to `EXPIRED` or
    /// `VERIFICATION_FAILED`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::AwaitingPayment, Self::Pending)
                | (Self::Pending, Self::SourceSettled)
                | (Self::SourceSettled, Self::BaseSettling)
                | (Self::BaseSettling, Self::BaseSettled)
                | (
                    Self::AwaitingPayment | Self::Pending,
                    Self::VerificationFailed | Self::Expired
                )
        )
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingPayment => "AWAITING_PAYMENT",
            Self::Pending => "PENDING",
            Self::SourceSettled => "SOURCE_SETTLED",
            Self::BaseSettling => "BASE_SETTLING",
            Self::BaseSettled => "BASE_SETTLED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Record of one on-chain settlement leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    /// The chain the settlement happened on.
    pub chain: ChainId,
    /// The transaction hash or signature.
    pub tx_hash: String,
    /// Explorer link for the transaction, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    /// When the settlement was recorded.
    pub settled_at: UnixTimestamp,
}

/// Request to create a new payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Merchant address the payout lands on.
    pub recipient: String,
    /// Amount the payer sends, human-denominated.
    pub sending_amount: Amount,
    /// The chain family the payer settles from.
    pub payer_chain: PayerChain,
}

/// A payment intent and everything frozen into it at creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Unique intent identifier.
    pub id: Uuid,
    /// Merchant address the payout lands on.
    pub recipient: String,
    /// The chain family the payer settles from.
    pub payer_chain: PayerChain,
    /// Amount the payer sends.
    pub sending_amount: Amount,
    /// Fee frozen at creation, never recomputed.
    pub estimated_fee: Decimal,
    /// `sending_amount - estimated_fee`, exactly as quoted.
    pub receiving_amount: Decimal,
    /// Current lifecycle status.
    pub status: IntentStatus,
    /// Creation time.
    pub created_at: UnixTimestamp,
    /// Hard deadline for securing funds.
    pub expires_at: UnixTimestamp,
    /// The payment terms every proof is checked against. Immutable.
    pub requirements: PaymentRequirements,
    /// Payer address recorded at verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Why verification failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<ErrorReason>,
    /// The replay key claimed by this intent's verified proof.
    #[serde(skip)]
    pub nonce: Option<String>,
    /// Number of proof submissions currently driving settlement. Expiry
    /// only abandons idle intents; while this is non-zero the reaper must
    /// leave the intent alone.
    #[serde(skip)]
    pub in_flight: u32,
    /// Source-chain settlement record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_settlement: Option<SettlementRecord>,
    /// Base payout settlement record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_settlement: Option<SettlementRecord>,
    /// When the payout was confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<UnixTimestamp>,
    /// Set when the payout retry budget is exhausted and an operator must
    /// intervene. The intent is never auto-failed after funds are secured.
    pub needs_attention: bool,
}

impl PaymentIntent {
    /// Moves the intent to `next`, enforcing lifecycle legality.
    ///
    /// This is the only place status is ever written.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::InvalidTransition`] if `next` is not a
    /// legal successor of the current status.
    pub fn transition(&mut self, next: IntentStatus) -> Result<(), SettlementError> {
        if !self.status.can_transition_to(next) {
            return Err(SettlementError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Returns `true` if the intent's funding deadline has passed.
    ///
    /// The deadline second itself still accepts proofs; expiry starts
    /// strictly after `expires_at`.
    #[must_use]
    pub fn is_past_expiry(&self, now: UnixTimestamp) -> bool {
        now > self.expires_at
    }
}

/// Validates that a recipient is a chain address the engine can pay out to.
///
/// Accepts a 0x-prefixed EVM address or a base58 Solana address. Anything
/// else, including email-style identifiers, is rejected: the engine does not
/// resolve off-chain identities.
///
/// # Errors
///
/// Returns [`SettlementError::InvalidRecipient`] otherwise.
pub fn validate_recipient(recipient: &str) -> Result<(), SettlementError> {
    if EVM_ADDRESS.is_match(recipient) || BASE58_ADDRESS.is_match(recipient) {
        Ok(())
    } else {
        Err(SettlementError::InvalidRecipient(recipient.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            IntentStatus::AwaitingPayment,
            IntentStatus::Pending,
            IntentStatus::SourceSettled,
            IntentStatus::BaseSettling,
            IntentStatus::BaseSettled,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_failure_after_funds_secured() {
        for status in [
            IntentStatus::SourceSettled,
            IntentStatus::BaseSettling,
            IntentStatus::BaseSettled,
        ] {
            assert!(!status.can_transition_to(IntentStatus::Expired));
            assert!(!status.can_transition_to(IntentStatus::VerificationFailed));
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        let all = [
            IntentStatus::AwaitingPayment,
            IntentStatus::Pending,
            IntentStatus::SourceSettled,
            IntentStatus::BaseSettling,
            IntentStatus::BaseSettled,
            IntentStatus::VerificationFailed,
            IntentStatus::Expired,
        ];
        for terminal in all.iter().filter(|s| s.is_terminal()) {
            for next in all {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!IntentStatus::Pending.can_transition_to(IntentStatus::AwaitingPayment));
        assert!(!IntentStatus::BaseSettling.can_transition_to(IntentStatus::SourceSettled));
        assert!(!IntentStatus::SourceSettled.can_transition_to(IntentStatus::Pending));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&IntentStatus::AwaitingPayment).unwrap();
        assert_eq!(json, "\"AWAITING_PAYMENT\"");
        let back: IntentStatus = serde_json::from_str("\"BASE_SETTLED\"").unwrap();
        assert_eq!(back, IntentStatus::BaseSettled);
    }

    #[test]
    fn expiry_starts_strictly_after_the_deadline_second() {
        let intent = intent_expiring_at(1_000);
        assert!(!intent.is_past_expiry(UnixTimestamp::from_secs(999)));
        assert!(!intent.is_past_expiry(UnixTimestamp::from_secs(1_000)));
        assert!(intent.is_past_expiry(UnixTimestamp::from_secs(1_001)));
    }

    fn intent_expiring_at(expires_at: u64) -> PaymentIntent {
        PaymentIntent {
            id: Uuid::new_v4(),
            recipient: "0x2222222222222222222222222222222222222222".to_owned(),
            payer_chain: PayerChain::Base,
            sending_amount: Amount::new(Decimal::new(10, 0)).unwrap(),
            estimated_fee: Decimal::new(5, 2),
            receiving_amount: Decimal::new(995, 2),
            status: IntentStatus::AwaitingPayment,
            created_at: UnixTimestamp::from_secs(400),
            expires_at: UnixTimestamp::from_secs(expires_at),
            requirements: PaymentRequirements {
                scheme: "exact".into(),
                network: "eip155:8453".parse().unwrap(),
                asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
                amount: s402::proto::U64String::from(10_000_000),
                pay_to: "0x2222222222222222222222222222222222222222".into(),
                max_timeout_seconds: 600,
                extra: None,
            },
            payer: None,
            failure_reason: None,
            nonce: None,
            in_flight: 0,
            source_settlement: None,
            base_settlement: None,
            completed_at: None,
            needs_attention: false,
        }
    }

    #[test]
    fn recipient_validation() {
        assert!(validate_recipient("0x2222222222222222222222222222222222222222").is_ok());
        assert!(validate_recipient("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").is_ok());
        assert!(validate_recipient("merchant@example.com").is_err());
        assert!(validate_recipient("0x1234").is_err());
        assert!(validate_recipient("").is_err());
    }
}
