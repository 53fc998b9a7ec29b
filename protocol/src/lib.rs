// Copyright (c) 2026 Vaultline Contributors. MIT License.
// See LICENSE for details.

//! # Vaultline Protocol — Platform Primitives
//!
//! Everything the accounting core stands on, and nothing it decides:
//!
//! - **config** — derivation seeds, decimals and limits.
//! - **crypto** — Ed25519 keys and signatures, SHA-256 and BLAKE3.
//! - **identity** — addresses, deterministic derivation, authenticated signers.
//! - **token** — the fungible-asset ledger the core issues into and settles
//!   against, with a signer-gated client for outside callers.
//! - **storage** — sled persistence for records and ledger state.
//!
//! The core itself lives in `vaultline-contracts`.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod storage;
pub mod token;
