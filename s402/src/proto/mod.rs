//! Protocol types for s402 settlement messages.
//!
//! This module defines the wire format used between payers and the settlement
//! core: the X402 v2 proof envelope, the payment requirements snapshot it is
//! checked against, the base64 codec, and the verification error taxonomy.
//!
//! # Wire Format
//!
//! All types serialize to JSON using camelCase field names. Large integers
//! (amounts in minor units, timestamps) are stringified to survive JSON
//! parsers that cannot represent 64-bit integers exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

mod encoding;
mod error;
mod timestamp;
pub mod v2;

pub use encoding::{Base64Bytes, MalformedProofError, decode_proof, encode_proof};
pub use error::{ErrorReason, VerificationError};
pub use timestamp::UnixTimestamp;

/// A `u64` value that serializes as a string.
///
/// Some JSON parsers (particularly in `JavaScript`) cannot accurately
/// represent large integers. This type serializes `u64` values as strings to
/// preserve precision across all platforms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct U64String(u64);

impl U64String {
    /// Returns the inner `u64` value.
    #[must_use]
    pub const fn inner(&self) -> u64 {
        self.0
    }
}

impl FromStr for U64String {
    type Err = <u64 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for U64String {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<U64String> for u64 {
    fn from(value: U64String) -> Self {
        value.0
    }
}

impl Serialize for U64String {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for U64String {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map(Self).map_err(serde::de::Error::custom)
    }
}
