#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana proof verification for the s402 settlement core.
//!
//! Verifies signed Solana transactions carrying an SPL Token
//! `TransferChecked` locally: the transaction is decoded from its base64
//! payload, the instruction shape is validated against the expected layout,
//! the transfer fields are checked against the frozen payment requirements
//! snapshot, and every required ed25519 signature is verified against its
//! static account key. No RPC access is needed; on-chain submission is the
//! chain adapter's job.
//!
//! # Modules
//!
//! - [`types`] - Wire payload and transaction/instruction views
//! - [`verify`] - Instruction validation and signature verification
//! - [`error`] - Chain-specific error types

pub mod error;
pub mod types;
pub mod verify;

pub use error::SolanaExactError;
pub use types::{SolanaPayload, TransactionView, VerifyLimits};
pub use verify::{VerifiedTransfer, verify_payment};
