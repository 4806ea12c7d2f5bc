//! Type definitions for the EIP-155 "exact" settlement scheme.
//!
//! Defines the EIP-3009 `transferWithAuthorization` wire types and the
//! matching EIP-712 struct used to reconstruct the signed typed data.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use s402::proto::UnixTimestamp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `U256` token amount that serializes as a decimal string.
///
/// EIP-3009 values are uint256 on-chain; the wire form is a decimal string
/// (`"10000000"` for 10 USDC) for the same precision reasons as every other
/// large integer in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount(U256);

impl TokenAmount {
    /// Returns the inner `U256` value.
    #[must_use]
    pub const fn inner(&self) -> U256 {
        self.0
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

/// EIP-3009 `transferWithAuthorization` payment payload.
///
/// Contains both the EIP-712 signature and the structured authorization
/// data that was signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Payload {
    /// The EOA signature authorizing the transfer (65 bytes, 0x-hex).
    pub signature: Bytes,

    /// The structured authorization data that was signed.
    pub authorization: Eip3009Authorization,
}

/// The EIP-3009 authorization message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    /// The address authorizing the transfer (token owner).
    pub from: Address,

    /// The recipient address for the transfer.
    pub to: Address,

    /// The amount of tokens to transfer (in the token's smallest unit).
    pub value: TokenAmount,

    /// The authorization is not valid before this timestamp (inclusive).
    pub valid_after: UnixTimestamp,

    /// The authorization expires at this timestamp (exclusive).
    pub valid_before: UnixTimestamp,

    /// A unique 32-byte nonce to prevent replay attacks.
    pub nonce: B256,
}

sol!(
    /// Solidity-compatible struct definition for ERC-3009 `transferWithAuthorization`.
    ///
    /// This matches the EIP-3009 format used in EIP-712 typed data and is
    /// used to reconstruct the typed-data message when verifying a payer's
    /// signature.
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

impl From<&Eip3009Authorization> for TransferWithAuthorization {
    fn from(auth: &Eip3009Authorization) -> Self {
        Self {
            from: auth.from,
            to: auth.to,
            value: auth.value.into(),
            validAfter: U256::from(auth.valid_after.as_secs()),
            validBefore: U256::from(auth.valid_before.as_secs()),
            nonce: auth.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_deserializes_from_camel_case() {
        let value = json!({
            "signature": "0x11",
            "authorization": {
                "from": "0x1111111111111111111111111111111111111111",
                "to": "0x2222222222222222222222222222222222222222",
                "value": "10000000",
                "validAfter": "0",
                "validBefore": "1999999999",
                "nonce": "0x0000000000000000000000000000000000000000000000000000000000000001"
            }
        });
        let payload: Eip3009Payload = serde_json::from_value(value).unwrap();
        assert_eq!(payload.authorization.value, TokenAmount::from(10_000_000u64));
        assert_eq!(payload.authorization.valid_before.as_secs(), 1_999_999_999);
    }

    #[test]
    fn token_amount_round_trips_as_string() {
        let amount = TokenAmount::from(1_000_000u64);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1000000\"");
        let back: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
