#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (Base/EVM) proof verification for the s402 settlement core.
//!
//! Verifies EIP-3009 `transferWithAuthorization` payloads locally: the
//! EIP-712 domain is reconstructed from the frozen payment requirements
//! snapshot, the typed-data hash is computed, and the signature must recover
//! to the claimed payer address. No RPC access is needed; on-chain submission
//! is the chain adapter's job.
//!
//! # Modules
//!
//! - [`types`] - EIP-3009 wire types and the `TransferWithAuthorization` EIP-712 struct
//! - [`verify`] - Precondition checks and signature recovery
//! - [`error`] - Chain-specific error types

pub mod error;
pub mod types;
pub mod verify;

pub use error::Eip155ExactError;
pub use types::{Eip3009Authorization, Eip3009Payload, TokenAmount};
pub use verify::{VerifiedTransfer, verify_payment};
