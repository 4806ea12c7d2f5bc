#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the s402 cross-chain settlement protocol.
//!
//! This crate provides the foundational, chain-agnostic types used by the
//! settlement engine: CAIP-2 chain identifiers, a registry of known networks,
//! decimal amount handling with the protocol's business bounds, and the X402
//! v2 proof envelope together with its base64/JSON codec.
//!
//! # Overview
//!
//! A payer authorizes a stablecoin transfer on their chain (Base or Solana)
//! and submits a base64-encoded proof envelope. The envelope carries a copy of
//! the payment requirements the payer accepted plus a chain-specific signed
//! payload. Chain-specific verification lives in separate crates
//! (`s402-evm`, `s402-svm`); the settlement state machine lives in
//! `s402-settlement`.
//!
//! # Modules
//!
//! - [`amount`] - Human-readable currency amount parsing and fee math
//! - [`chain`] - Blockchain identifiers (CAIP-2) and the payer chain enum
//! - [`networks`] - Registry of well-known networks and token deployments
//! - [`proto`] - Wire format types, the proof codec, and timestamps

pub mod amount;
pub mod chain;
pub mod networks;
pub mod proto;
