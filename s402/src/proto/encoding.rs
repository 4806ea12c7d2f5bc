//! Base64 proof codec for the s402 wire format.
//!
//! The settle proof travels as a base64-encoded JSON envelope. Decoding here
//! is structural only: base64, JSON shape, and the protocol version tag.
//! Cryptographic content is untouched until chain-specific verification.

use std::fmt::{self, Display, Formatter};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;

use super::v2::{SettleProof, X402_VERSION};

/// A wrapper for base64-encoded byte data.
///
/// This type holds bytes that represent base64-encoded data and provides
/// methods for encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let encoded = b64.encode(input.as_ref());
        Self(encoded.into_bytes())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Errors produced while decoding a proof envelope.
#[derive(Debug, thiserror::Error)]
pub enum MalformedProofError {
    /// The input is not valid base64.
    #[error("Can not decode base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not the expected JSON shape.
    #[error("Can not parse proof envelope: {0}")]
    Json(#[from] serde_json::Error),
    /// The envelope carries an unsupported protocol version.
    #[error("Unsupported x402 version {0}, expected {X402_VERSION}")]
    UnsupportedVersion(u32),
}

/// Decodes a base64 proof string into a [`SettleProof`].
///
/// Fails on base64 decode failure, JSON parse failure, missing required
/// fields, or an `x402Version` other than 2. Structural validation only; the
/// signed payload inside is passed through untouched.
///
/// # Errors
///
/// Returns [`MalformedProofError`] describing which layer rejected the input.
pub fn decode_proof(encoded: &str) -> Result<SettleProof, MalformedProofError> {
    let bytes = Base64Bytes::from(encoded.as_bytes()).decode()?;
    let proof: SettleProof = serde_json::from_slice(&bytes)?;
    if proof.x402_version != X402_VERSION {
        return Err(MalformedProofError::UnsupportedVersion(proof.x402_version));
    }
    #[cfg(feature = "telemetry")]
    tracing::trace!(scheme = %proof.scheme(), network = %proof.network(), "Decoded settle proof");
    Ok(proof)
}

/// Encodes a [`SettleProof`] to its base64 wire form.
///
/// Exact inverse of [`decode_proof`]: `decode_proof(&encode_proof(p)?)? == p`
/// for every structurally valid proof.
///
/// # Errors
///
/// Returns [`MalformedProofError::Json`] if the proof cannot be serialized,
/// which only happens for payloads containing non-JSON values.
pub fn encode_proof(proof: &SettleProof) -> Result<String, MalformedProofError> {
    let json = serde_json::to_vec(proof)?;
    Ok(Base64Bytes::encode(json).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::U64String;
    use crate::proto::v2::{AssetMetadata, PaymentRequirements};
    use serde_json::json;

    fn sample_proof() -> SettleProof {
        SettleProof {
            x402_version: X402_VERSION,
            payload: json!({
                "signature": "0xdeadbeef",
                "authorization": {
                    "from": "0x1111111111111111111111111111111111111111",
                    "to": "0x2222222222222222222222222222222222222222",
                    "value": "10000000",
                    "validAfter": "0",
                    "validBefore": "1999999999",
                    "nonce": "0x0000000000000000000000000000000000000000000000000000000000000001"
                }
            }),
            accepted: PaymentRequirements {
                scheme: "exact".into(),
                network: "eip155:8453".parse().unwrap(),
                asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
                amount: U64String::from(10_000_000),
                pay_to: "0x2222222222222222222222222222222222222222".into(),
                max_timeout_seconds: 600,
                extra: Some(AssetMetadata {
                    name: "USD Coin".into(),
                    version: "2".into(),
                }),
            },
            resource: None,
        }
    }

    #[test]
    fn round_trip_identity() {
        let proof = sample_proof();
        let encoded = encode_proof(&proof).unwrap();
        let decoded = decode_proof(&encoded).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            decode_proof("this is not base64!!!"),
            Err(MalformedProofError::Base64(_))
        ));
    }

    #[test]
    fn rejects_bad_json() {
        let encoded = Base64Bytes::encode(b"{not json").to_string();
        assert!(matches!(
            decode_proof(&encoded),
            Err(MalformedProofError::Json(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let encoded = Base64Bytes::encode(br#"{"x402Version": 2}"#).to_string();
        assert!(matches!(
            decode_proof(&encoded),
            Err(MalformedProofError::Json(_))
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut proof = sample_proof();
        proof.x402_version = 1;
        let encoded = encode_proof(&proof).unwrap();
        assert!(matches!(
            decode_proof(&encoded),
            Err(MalformedProofError::UnsupportedVersion(1))
        ));
    }
}
