//! Proof verification logic for the Solana exact scheme.
//!
//! The transaction is decoded from the payload and checked locally: compute
//! budget instruction shape, a single SPL Token `TransferChecked` matching
//! the frozen requirements snapshot, and ed25519 verification of every
//! required signature against its static account key. No RPC access.
//!
//! # Transaction Structure
//!
//! - Index 0: `SetComputeUnitLimit` instruction
//! - Index 1: `SetComputeUnitPrice` instruction
//! - Index 2: `TransferChecked` instruction (SPL Token or Token-2022)

use std::str::FromStr;

use s402::proto::VerificationError;
use s402::proto::v2::PaymentRequirements;
use solana_compute_budget_interface::ID as COMPUTE_BUDGET_PROGRAM;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

use crate::error::SolanaExactError;
use crate::types::{ATA_PROGRAM_PUBKEY, SolanaPayload, TransactionView, VerifyLimits};

/// Result of a successful Solana transfer verification.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedTransfer {
    /// The transfer authority, verified as a signer.
    pub payer: Pubkey,
    /// The token mint being transferred.
    pub mint: Pubkey,
    /// The destination token account.
    pub destination: Pubkey,
    /// Transfer amount in token base units.
    pub amount: u64,
    /// The transaction's fee payer signature, used as the replay key.
    pub signature: Signature,
}

/// Parsed SPL Token `TransferChecked` instruction fields.
#[derive(Debug, Clone, Copy)]
pub struct TransferCheckedFields {
    /// Transfer amount in token base units.
    pub amount: u64,
    /// Source token account.
    pub source: Pubkey,
    /// Token mint address.
    pub mint: Pubkey,
    /// Destination token account.
    pub destination: Pubkey,
    /// Authority (signer) of the transfer.
    pub authority: Pubkey,
    /// SPL Token program ID (Token or Token-2022).
    pub token_program: Pubkey,
}

/// Deserializes the chain-specific payload from the proof envelope.
///
/// # Errors
///
/// Returns [`VerificationError::InvalidFormat`] if the payload is not a
/// Solana payload.
pub fn decode_payload(payload: &serde_json::Value) -> Result<SolanaPayload, VerificationError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| SolanaExactError::PayloadDecoding(e.to_string()).into())
}

/// Verifies the compute unit limit instruction at the given index and
/// returns the requested limit.
///
/// # Errors
///
/// Returns [`SolanaExactError`] if the instruction is invalid.
pub fn verify_compute_limit_instruction(
    view: &TransactionView,
    instruction_index: usize,
) -> Result<u32, SolanaExactError> {
    let instruction = view.instruction(instruction_index)?;
    let data = instruction.data_slice();

    if COMPUTE_BUDGET_PROGRAM.ne(&instruction.program_id())
        || data.first().copied().unwrap_or(0) != 2
        || data.len() != 5
    {
        return Err(SolanaExactError::InvalidComputeLimitInstruction);
    }

    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[1..5]);
    Ok(u32::from_le_bytes(buf))
}

/// Verifies the compute unit price instruction at the given index.
///
/// # Errors
///
/// Returns [`SolanaExactError`] if the instruction is invalid or the price
/// exceeds `max_compute_unit_price`.
pub fn verify_compute_price_instruction(
    max_compute_unit_price: u64,
    view: &TransactionView,
    instruction_index: usize,
) -> Result<(), SolanaExactError> {
    let instruction = view.instruction(instruction_index)?;
    let data = instruction.data_slice();

    if COMPUTE_BUDGET_PROGRAM.ne(&instruction.program_id())
        || data.first().copied().unwrap_or(0) != 3
        || data.len() != 9
    {
        return Err(SolanaExactError::InvalidComputePriceInstruction);
    }

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[1..]);
    let microlamports = u64::from_le_bytes(buf);
    if microlamports > max_compute_unit_price {
        return Err(SolanaExactError::MaxComputeUnitPriceExceeded);
    }
    Ok(())
}

/// Parses the SPL Token `TransferChecked` instruction at the given index.
///
/// # Errors
///
/// Returns [`SolanaExactError`] if the instruction is not a `TransferChecked`
/// from the Token or Token-2022 program.
pub fn parse_transfer_instruction(
    view: &TransactionView,
    instruction_index: usize,
) -> Result<TransferCheckedFields, SolanaExactError> {
    let instruction = view.instruction(instruction_index)?;
    instruction.assert_not_empty()?;
    let program_id = instruction.program_id();
    if program_id == ATA_PROGRAM_PUBKEY {
        return Err(SolanaExactError::CreateAtaNotSupported);
    }
    // Both spl_token and spl_token_2022 share the same instruction layout,
    // so we use spl_token's unpack for both and only differentiate by program ID.
    let token_program = if spl_token::ID.eq(&program_id) {
        spl_token::ID
    } else if spl_token_2022::ID.eq(&program_id) {
        spl_token_2022::ID
    } else {
        return Err(SolanaExactError::InvalidTokenInstruction);
    };
    let token_instruction =
        spl_token::instruction::TokenInstruction::unpack(instruction.data_slice())
            .map_err(|_| SolanaExactError::InvalidTokenInstruction)?;
    let spl_token::instruction::TokenInstruction::TransferChecked {
        amount,
        decimals: _,
    } = token_instruction
    else {
        return Err(SolanaExactError::InvalidTokenInstruction);
    };

    Ok(TransferCheckedFields {
        amount,
        source: instruction.account(0)?,
        mint: instruction.account(1)?,
        destination: instruction.account(2)?,
        authority: instruction.account(3)?,
        token_program,
    })
}

/// Verifies a Solana payload against the frozen requirements snapshot.
///
/// Checks, in order: chain namespace, transaction decoding, instruction
/// shape and compute budget ceilings, the `TransferChecked` fields (mint,
/// destination ATA, amount), that the transfer authority is a required
/// signer, and finally every required ed25519 signature.
///
/// # Errors
///
/// Returns a [`VerificationError`] naming the first failed check.
pub fn verify_payment(
    requirements: &PaymentRequirements,
    payload: &SolanaPayload,
    limits: &VerifyLimits,
) -> Result<VerifiedTransfer, VerificationError> {
    if requirements.network.namespace() != "solana" {
        return Err(VerificationError::ChainIdMismatch);
    }

    let bytes = s402::proto::Base64Bytes::from(payload.transaction.as_bytes())
        .decode()
        .map_err(|e| SolanaExactError::TransactionDecoding(e.to_string()))?;
    let transaction = bincode::deserialize::<VersionedTransaction>(bytes.as_slice())
        .map_err(|e| SolanaExactError::TransactionDecoding(e.to_string()))?;
    let view = TransactionView::new(transaction);

    if view.instruction_count() < 3 {
        return Err(SolanaExactError::TooFewInstructions.into());
    }
    if view.instruction_count() > 3 {
        return Err(SolanaExactError::AdditionalInstructionsNotAllowed.into());
    }

    let compute_units = verify_compute_limit_instruction(&view, 0)?;
    if compute_units > limits.max_compute_unit_limit {
        return Err(SolanaExactError::MaxComputeUnitLimitExceeded.into());
    }
    #[cfg(feature = "telemetry")]
    tracing::debug!(compute_units, "Verified compute unit limit");
    verify_compute_price_instruction(limits.max_compute_unit_price, &view, 1)?;

    let transfer = parse_transfer_instruction(&view, 2)?;

    let mint = Pubkey::from_str(&requirements.asset)
        .map_err(|_| SolanaExactError::InvalidAssetAddress(requirements.asset.clone()))?;
    if transfer.mint != mint {
        return Err(VerificationError::AssetMismatch);
    }

    let pay_to = Pubkey::from_str(&requirements.pay_to)
        .map_err(|_| SolanaExactError::InvalidPayToAddress(requirements.pay_to.clone()))?;
    let (ata, _) = Pubkey::find_program_address(
        &[
            pay_to.as_ref(),
            transfer.token_program.as_ref(),
            mint.as_ref(),
        ],
        &ATA_PROGRAM_PUBKEY,
    );
    if transfer.destination != ata {
        return Err(VerificationError::RecipientMismatch);
    }

    if transfer.amount != requirements.amount() {
        return Err(VerificationError::AmountMismatch);
    }

    if !view.required_signers().contains(&transfer.authority) {
        return Err(SolanaExactError::AuthorityNotSigner(transfer.authority).into());
    }

    view.verify_signatures()?;
    #[cfg(feature = "telemetry")]
    tracing::debug!(payer = %transfer.authority, "Verified transfer signatures");

    let signature = view
        .inner()
        .signatures
        .first()
        .copied()
        .ok_or(SolanaExactError::MissingSignatures)?;

    Ok(VerifiedTransfer {
        payer: transfer.authority,
        mint: transfer.mint,
        destination: transfer.destination,
        amount: transfer.amount,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use s402::proto::{Base64Bytes, U64String};
    use solana_hash::Hash;
    use solana_keypair::Keypair;
    use solana_message::compiled_instruction::CompiledInstruction;
    use solana_message::{Message, MessageHeader, VersionedMessage};
    use solana_signer::Signer;

    const SOLANA_MAINNET: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";

    fn compute_limit_data(limit: u32) -> Vec<u8> {
        let mut data = vec![2u8];
        data.extend_from_slice(&limit.to_le_bytes());
        data
    }

    fn compute_price_data(price: u64) -> Vec<u8> {
        let mut data = vec![3u8];
        data.extend_from_slice(&price.to_le_bytes());
        data
    }

    fn transfer_data(amount: u64) -> Vec<u8> {
        spl_token::instruction::TokenInstruction::TransferChecked {
            amount,
            decimals: 6,
        }
        .pack()
    }

    struct Fixture {
        payer: Keypair,
        mint: Pubkey,
        merchant: Pubkey,
        requirements: PaymentRequirements,
    }

    impl Fixture {
        fn new(amount: u64) -> Self {
            let payer = Keypair::new();
            let mint = Pubkey::new_unique();
            let merchant = Pubkey::new_unique();
            let requirements = PaymentRequirements {
                scheme: "exact".into(),
                network: SOLANA_MAINNET.parse().unwrap(),
                asset: mint.to_string(),
                amount: U64String::from(amount),
                pay_to: merchant.to_string(),
                max_timeout_seconds: 600,
                extra: None,
            };
            Self {
                payer,
                mint,
                merchant,
                requirements,
            }
        }

        fn destination_ata(&self) -> Pubkey {
            Pubkey::find_program_address(
                &[
                    self.merchant.as_ref(),
                    spl_token::ID.as_ref(),
                    self.mint.as_ref(),
                ],
                &ATA_PROGRAM_PUBKEY,
            )
            .0
        }

        /// Builds a signed transaction transferring `amount` to `destination`.
        ///
        /// Account keys: 0 payer (signer), 1 source, 2 mint, 3 destination,
        /// 4 compute budget program, 5 token program.
        fn transaction(&self, amount: u64, destination: Pubkey) -> VersionedTransaction {
            let source = Pubkey::new_unique();
            let instructions = vec![
                CompiledInstruction::new_from_raw_parts(4, compute_limit_data(200_000), vec![]),
                CompiledInstruction::new_from_raw_parts(4, compute_price_data(1_000), vec![]),
                CompiledInstruction::new_from_raw_parts(
                    5,
                    transfer_data(amount),
                    vec![1, 2, 3, 0],
                ),
            ];
            let message = Message {
                header: MessageHeader {
                    num_required_signatures: 1,
                    num_readonly_signed_accounts: 0,
                    num_readonly_unsigned_accounts: 2,
                },
                account_keys: vec![
                    self.payer.pubkey(),
                    source,
                    self.mint,
                    destination,
                    COMPUTE_BUDGET_PROGRAM,
                    spl_token::ID,
                ],
                recent_blockhash: Hash::default(),
                instructions,
            };
            let message = VersionedMessage::Legacy(message);
            let signature = self.payer.sign_message(&message.serialize());
            VersionedTransaction {
                signatures: vec![signature],
                message,
            }
        }

        fn payload(&self, transaction: &VersionedTransaction) -> SolanaPayload {
            let bytes = bincode::serialize(transaction).unwrap();
            SolanaPayload {
                transaction: Base64Bytes::encode(bytes).to_string(),
            }
        }
    }

    #[test]
    fn valid_transaction_verifies() {
        let fx = Fixture::new(10_000_000);
        let tx = fx.transaction(10_000_000, fx.destination_ata());
        let payload = fx.payload(&tx);

        let verified =
            verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap();
        assert_eq!(verified.payer, fx.payer.pubkey());
        assert_eq!(verified.amount, 10_000_000);
        assert_eq!(verified.signature, tx.signatures[0]);
    }

    #[test]
    fn amount_mismatch_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let tx = fx.transaction(9_000_000, fx.destination_ata());
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::AmountMismatch));
    }

    #[test]
    fn wrong_destination_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let tx = fx.transaction(10_000_000, Pubkey::new_unique());
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::RecipientMismatch));
    }

    #[test]
    fn wrong_mint_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let tx = fx.transaction(10_000_000, fx.destination_ata());
        let payload = fx.payload(&tx);
        let mut requirements = fx.requirements.clone();
        requirements.asset = Pubkey::new_unique().to_string();

        let err = verify_payment(&requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::AssetMismatch));
    }

    #[test]
    fn default_signature_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let mut tx = fx.transaction(10_000_000, fx.destination_ata());
        tx.signatures[0] = Signature::default();
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureInvalid(_)));
    }

    #[test]
    fn tampered_message_fails_signature_check() {
        let fx = Fixture::new(10_000_000);
        let mut tx = fx.transaction(10_000_000, fx.destination_ata());
        // Bump the compute price after signing; structural checks still pass.
        if let VersionedMessage::Legacy(message) = &mut tx.message {
            message.instructions[1].data = compute_price_data(2_000);
        }
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureInvalid(_)));
    }

    #[test]
    fn compute_limit_over_ceiling_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let mut tx = fx.transaction(10_000_000, fx.destination_ata());
        if let VersionedMessage::Legacy(message) = &mut tx.message {
            message.instructions[0].data = compute_limit_data(2_000_000);
        }
        let signature = fx.payer.sign_message(&tx.message.serialize());
        tx.signatures = vec![signature];
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedInstructions(_)));
    }

    #[test]
    fn missing_compute_budget_prefix_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let mut tx = fx.transaction(10_000_000, fx.destination_ata());
        if let VersionedMessage::Legacy(message) = &mut tx.message {
            // Wrong discriminant for SetComputeUnitLimit.
            message.instructions[0].data = vec![9, 0, 0, 0, 0];
        }
        let signature = fx.payer.sign_message(&tx.message.serialize());
        tx.signatures = vec![signature];
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedInstructions(_)));
    }

    #[test]
    fn extra_instructions_are_rejected() {
        let fx = Fixture::new(10_000_000);
        let mut tx = fx.transaction(10_000_000, fx.destination_ata());
        if let VersionedMessage::Legacy(message) = &mut tx.message {
            message
                .instructions
                .push(CompiledInstruction::new_from_raw_parts(4, vec![2, 0, 0, 0, 0], vec![]));
        }
        let signature = fx.payer.sign_message(&tx.message.serialize());
        tx.signatures = vec![signature];
        let payload = fx.payload(&tx);

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedInstructions(_)));
    }

    #[test]
    fn garbage_transaction_bytes_are_rejected() {
        let fx = Fixture::new(10_000_000);
        let payload = SolanaPayload {
            transaction: Base64Bytes::encode(b"not a transaction").to_string(),
        };

        let err = verify_payment(&fx.requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::InvalidFormat(_)));
    }

    #[test]
    fn evm_network_is_rejected() {
        let fx = Fixture::new(10_000_000);
        let tx = fx.transaction(10_000_000, fx.destination_ata());
        let payload = fx.payload(&tx);
        let mut requirements = fx.requirements.clone();
        requirements.network = "eip155:8453".parse().unwrap();

        let err = verify_payment(&requirements, &payload, &VerifyLimits::default()).unwrap_err();
        assert!(matches!(err, VerificationError::ChainIdMismatch));
    }
}
