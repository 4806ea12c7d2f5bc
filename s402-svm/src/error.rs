//! Error types for the Solana exact settlement scheme.

use s402::proto::VerificationError;
use solana_pubkey::Pubkey;

/// Errors specific to Solana exact scheme verification.
#[derive(Debug, thiserror::Error)]
pub enum SolanaExactError {
    /// The chain-specific payload could not be deserialized.
    #[error("Can not decode Solana payload: {0}")]
    PayloadDecoding(String),
    /// Transaction could not be deserialized.
    #[error("Can not decode transaction: {0}")]
    TransactionDecoding(String),
    /// The asset in the requirements snapshot is not a valid mint address.
    #[error("Invalid asset mint address: {0}")]
    InvalidAssetAddress(String),
    /// The payTo in the requirements snapshot is not a valid Solana address.
    #[error("Invalid payTo address: {0}")]
    InvalidPayToAddress(String),
    /// Compute unit limit exceeds the configured maximum.
    #[error("Compute unit limit exceeds maximum")]
    MaxComputeUnitLimitExceeded,
    /// Compute unit price exceeds the configured maximum.
    #[error("Compute unit price exceeds maximum")]
    MaxComputeUnitPriceExceeded,
    /// Transaction has too few instructions.
    #[error("Too few instructions in transaction")]
    TooFewInstructions,
    /// Additional instructions are not permitted.
    #[error("Additional instructions not allowed")]
    AdditionalInstructionsNotAllowed,
    /// ATA creation instruction is not supported.
    #[error("CreateATA instruction not supported - destination ATA must exist")]
    CreateAtaNotSupported,
    /// No instruction found at the given index.
    #[error("Instruction at index {0} not found")]
    NoInstructionAtIndex(usize),
    /// No account found at the given index.
    #[error("No account at index {0}")]
    NoAccountAtIndex(u8),
    /// Instruction at the given index has no data or accounts.
    #[error("Empty instruction at index {0}")]
    EmptyInstructionAtIndex(usize),
    /// Compute limit instruction could not be parsed.
    #[error("Invalid compute limit instruction")]
    InvalidComputeLimitInstruction,
    /// Compute price instruction could not be parsed.
    #[error("Invalid compute price instruction")]
    InvalidComputePriceInstruction,
    /// Token instruction could not be parsed.
    #[error("Invalid token instruction")]
    InvalidTokenInstruction,
    /// Transaction carries fewer signatures than required signers.
    #[error("Transaction is missing required signatures")]
    MissingSignatures,
    /// A required signature does not verify against its account key.
    #[error("Signature for signer {0} does not verify")]
    SignatureVerificationFailed(Pubkey),
    /// The transfer authority is not among the required signers.
    #[error("Transfer authority {0} is not a required signer")]
    AuthorityNotSigner(Pubkey),
}

impl From<SolanaExactError> for VerificationError {
    fn from(e: SolanaExactError) -> Self {
        match e {
            SolanaExactError::PayloadDecoding(_) | SolanaExactError::TransactionDecoding(_) => {
                Self::InvalidFormat(e.to_string())
            }
            SolanaExactError::InvalidAssetAddress(_) => Self::AssetMismatch,
            SolanaExactError::InvalidPayToAddress(_) => Self::RecipientMismatch,
            SolanaExactError::MissingSignatures
            | SolanaExactError::SignatureVerificationFailed(_)
            | SolanaExactError::AuthorityNotSigner(_) => Self::SignatureInvalid(e.to_string()),
            SolanaExactError::MaxComputeUnitLimitExceeded
            | SolanaExactError::MaxComputeUnitPriceExceeded
            | SolanaExactError::TooFewInstructions
            | SolanaExactError::AdditionalInstructionsNotAllowed
            | SolanaExactError::CreateAtaNotSupported
            | SolanaExactError::NoInstructionAtIndex(_)
            | SolanaExactError::NoAccountAtIndex(_)
            | SolanaExactError::EmptyInstructionAtIndex(_)
            | SolanaExactError::InvalidComputeLimitInstruction
            | SolanaExactError::InvalidComputePriceInstruction
            | SolanaExactError::InvalidTokenInstruction => {
                Self::MalformedInstructions(e.to_string())
            }
        }
    }
}
