//! # Cryptographic Primitives
//!
//! - **Ed25519** (`ed25519-dalek`) for keys and instruction signatures, and
//!   for the curve check that keeps derived addresses keyless.
//! - **SHA-256** for address derivation and instruction ids.
//! - **BLAKE3** for state fingerprints.
//!
//! Everything here wraps audited implementations.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, domain_separated_hash, sha256, sha256_multi};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
