//! Error types for the EIP-155 exact settlement scheme.

use s402::proto::VerificationError;

/// Errors specific to EIP-155 exact scheme verification.
#[derive(Debug, thiserror::Error)]
pub enum Eip155ExactError {
    /// The chain-specific payload could not be deserialized.
    #[error("Can not decode EIP-3009 payload: {0}")]
    PayloadDecoding(String),
    /// The asset in the requirements snapshot is not a valid EVM address.
    #[error("Invalid asset address: {0}")]
    InvalidAssetAddress(String),
    /// The payTo in the requirements snapshot is not a valid EVM address.
    #[error("Invalid payTo address: {0}")]
    InvalidPayToAddress(String),
    /// The CAIP-2 reference is not a numeric EVM chain id.
    #[error("Invalid eip155 chain reference: {0}")]
    InvalidChainReference(String),
    /// The requirements snapshot is missing the EIP-712 domain metadata.
    #[error("Requirements extra is missing EIP-712 name/version")]
    MissingDomainMetadata,
    /// The signature bytes could not be parsed.
    #[error("Can not parse signature: {0}")]
    MalformedSignature(String),
}

impl From<Eip155ExactError> for VerificationError {
    fn from(e: Eip155ExactError) -> Self {
        match e {
            Eip155ExactError::PayloadDecoding(_) => Self::InvalidFormat(e.to_string()),
            Eip155ExactError::InvalidAssetAddress(_) => Self::AssetMismatch,
            Eip155ExactError::InvalidPayToAddress(_) => Self::RecipientMismatch,
            Eip155ExactError::InvalidChainReference(_) => Self::ChainIdMismatch,
            Eip155ExactError::MissingDomainMetadata | Eip155ExactError::MalformedSignature(_) => {
                Self::SignatureInvalid(e.to_string())
            }
        }
    }
}
