//! # Token Module
//!
//! The fungible-asset ledger the core settles against.
//!
//! - **ledger** — the [`AssetLedger`] trait, mint and account records, errors.
//! - **memory** — [`TokenLedger`], the in-memory implementation.
//! - **client** — [`TokenClient`], signer-gated access for outside callers.

pub mod client;
pub mod ledger;
pub mod memory;

pub use client::TokenClient;
pub use ledger::{AssetLedger, Mint, TokenAccount, TokenError, TokenResult};
pub use memory::TokenLedger;
