//! # Storage Module
//!
//! On-disk persistence for the ledger. One sled database, five trees
//! (`records`, `mints`, `token_accounts`, `nonces`, `metadata`), bincode
//! values.
//!
//! The in-memory state is authoritative while a process runs; the database
//! holds the last snapshot written. Loading rebuilds every derived index
//! (such as the capability holders index) from the stored accounts.

pub mod db;

pub use db::{DbError, DbResult, LedgerDb, SnapshotMeta};
