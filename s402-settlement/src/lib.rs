#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Cross-chain stablecoin settlement engine.
//!
//! Payers fund from Base or Solana; merchants are always paid out on Base.
//! The engine owns the payment-intent lifecycle: an intent freezes the
//! payment terms and fee at creation, a submitted proof is verified locally
//! against that frozen snapshot, the payer's funds are secured on the source
//! chain, and a background task drives the Base payout to completion.
//!
//! Everything that touches a blockchain sits behind the [`ChainAdapter`]
//! trait; the engine itself never speaks RPC.
//!
//! # Modules
//!
//! - [`intent`] - The [`PaymentIntent`] model and state machine
//! - [`store`] - In-memory intent table and the nonce replay guard
//! - [`verify`] - Chain dispatch for proof verification
//! - [`orchestrator`] - Proof intake and the payout leg
//! - [`reaper`] - Background expiry sweep
//! - [`adapter`] - The chain backend seam
//! - [`service`] - The embedding-facing facade
//! - [`config`] - TOML configuration with env expansion
//! - [`error`] - Error taxonomy with codes and response categories

pub mod adapter;
pub mod config;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod reaper;
pub mod service;
pub mod store;
pub mod verify;

pub use adapter::{AdapterError, ChainAdapter};
pub use config::SettlementConfig;
pub use error::{ErrorCategory, SettlementError};
pub use intent::{CreateIntentRequest, IntentStatus, PaymentIntent, SettlementRecord};
pub use service::SettlementService;
pub use verify::VerifiedPayment;
