//! Type definitions for the Solana "exact" settlement scheme.
//!
//! Defines the wire payload (a base64-encoded serialized transaction) and
//! a thin view layer over [`VersionedTransaction`] used by verification.

use serde::{Deserialize, Serialize};
use solana_message::compiled_instruction::CompiledInstruction;
use solana_pubkey::{Pubkey, pubkey};
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

use crate::error::SolanaExactError;

/// Associated Token Account program public key.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Solana exact payment payload containing a serialized transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaPayload {
    /// Base64-encoded serialized Solana transaction.
    pub transaction: String,
}

/// Compute budget ceilings applied during verification.
///
/// A transaction exceeding either ceiling is rejected before any signature
/// work is done.
#[derive(Debug, Clone, Copy)]
pub struct VerifyLimits {
    /// Maximum compute unit limit the transaction may request.
    pub max_compute_unit_limit: u32,
    /// Maximum compute unit price, in microlamports.
    pub max_compute_unit_price: u64,
}

impl Default for VerifyLimits {
    fn default() -> Self {
        Self {
            max_compute_unit_limit: 1_400_000,
            max_compute_unit_price: 5_000_000,
        }
    }
}

/// Wrapper around a versioned Solana transaction with verification helpers.
#[derive(Debug)]
pub struct TransactionView {
    inner: VersionedTransaction,
}

impl TransactionView {
    /// Creates a new transaction view.
    #[must_use]
    pub const fn new(transaction: VersionedTransaction) -> Self {
        Self { inner: transaction }
    }

    /// Returns the inner transaction.
    #[must_use]
    pub const fn inner(&self) -> &VersionedTransaction {
        &self.inner
    }

    /// Returns the number of instructions in the message.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.inner.message.instructions().len()
    }

    /// Returns the instruction at the given index with resolved account keys.
    ///
    /// # Errors
    ///
    /// Returns [`SolanaExactError::NoInstructionAtIndex`] if out of bounds.
    pub fn instruction(&self, index: usize) -> Result<InstructionView, SolanaExactError> {
        let instruction = self
            .inner
            .message
            .instructions()
            .get(index)
            .cloned()
            .ok_or(SolanaExactError::NoInstructionAtIndex(index))?;
        let account_keys = self.inner.message.static_account_keys().to_vec();

        Ok(InstructionView {
            index,
            instruction,
            account_keys,
        })
    }

    /// Returns the required signer keys, in signing order.
    #[must_use]
    pub fn required_signers(&self) -> &[Pubkey] {
        let num_required = self.inner.message.header().num_required_signatures as usize;
        let keys = self.inner.message.static_account_keys();
        &keys[..num_required.min(keys.len())]
    }

    /// Verifies every required signature against its static account key.
    ///
    /// Signatures are checked over the serialized message bytes. A missing or
    /// default signature fails, as does any signature that does not verify
    /// against the key at the matching position.
    ///
    /// # Errors
    ///
    /// Returns [`SolanaExactError`] naming the failed signer.
    pub fn verify_signatures(&self) -> Result<(), SolanaExactError> {
        let num_required = self.inner.message.header().num_required_signatures as usize;
        let keys = self.inner.message.static_account_keys();
        if self.inner.signatures.len() < num_required || keys.len() < num_required {
            return Err(SolanaExactError::MissingSignatures);
        }

        let message_bytes = self.inner.message.serialize();
        let default = Signature::default();
        for (signature, key) in self.inner.signatures[..num_required]
            .iter()
            .zip(&keys[..num_required])
        {
            if default.eq(signature) {
                return Err(SolanaExactError::MissingSignatures);
            }
            if !signature.verify(key.as_ref(), &message_bytes) {
                return Err(SolanaExactError::SignatureVerificationFailed(*key));
            }
        }
        Ok(())
    }
}

/// Parsed instruction with its index and resolved account keys.
#[derive(Debug)]
pub struct InstructionView {
    index: usize,
    instruction: CompiledInstruction,
    account_keys: Vec<Pubkey>,
}

impl InstructionView {
    /// Returns the instruction data as a slice.
    #[must_use]
    pub const fn data_slice(&self) -> &[u8] {
        self.instruction.data.as_slice()
    }

    /// Asserts that the instruction carries both data and accounts.
    ///
    /// # Errors
    ///
    /// Returns [`SolanaExactError::EmptyInstructionAtIndex`] otherwise.
    pub const fn assert_not_empty(&self) -> Result<(), SolanaExactError> {
        if self.instruction.data.is_empty() || self.instruction.accounts.is_empty() {
            return Err(SolanaExactError::EmptyInstructionAtIndex(self.index));
        }
        Ok(())
    }

    /// Returns the program ID of the instruction.
    #[must_use]
    pub fn program_id(&self) -> Pubkey {
        *self.instruction.program_id(self.account_keys.as_slice())
    }

    /// Returns the account public key at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`SolanaExactError::NoAccountAtIndex`] if out of bounds.
    pub fn account(&self, index: u8) -> Result<Pubkey, SolanaExactError> {
        let account_index = self
            .instruction
            .accounts
            .get(index as usize)
            .copied()
            .ok_or(SolanaExactError::NoAccountAtIndex(index))?;
        let pubkey = self
            .account_keys
            .get(account_index as usize)
            .copied()
            .ok_or(SolanaExactError::NoAccountAtIndex(index))?;
        Ok(pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_deserializes_from_camel_case() {
        let payload: SolanaPayload =
            serde_json::from_str(r#"{"transaction":"AQID"}"#).unwrap();
        assert_eq!(payload.transaction, "AQID");
    }
}
