//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **SHA-256** builds derived-address preimages and instruction ids. The
//!   derivation scheme is SHA-256 based so that addresses can be recomputed
//!   by any client with a stock SHA-256 implementation.
//! - **BLAKE3** fingerprints ledger state for persistence checks and logging.

use sha2::{Digest, Sha256};

/// SHA-256 over the concatenation of `parts`, returned as a fixed array.
///
/// Callers are responsible for making the concatenation unambiguous
/// (length prefixes, fixed-width fields). See
/// [`derivation`](crate::identity::derivation) for the one place that matters.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 of a single byte string.
///
/// ```
/// use vaultline_protocol::crypto::sha256;
///
/// assert_eq!(sha256(b"vaultline").len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256_multi(&[data])
}

/// BLAKE3 of a single byte string.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Domain-separated BLAKE3: the context string keys the hash so that equal
/// payloads under different contexts never collide.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_multi_equals_concatenation() {
        assert_eq!(sha256_multi(&[b"ab", b"c"]), sha256(b"abc"));
        assert_eq!(sha256_multi(&[]), sha256(b""));
    }

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"vault"), blake3_hash(b"vault"));
        assert_ne!(blake3_hash(b"vault"), blake3_hash(b"branch"));
    }

    #[test]
    fn domain_separation_changes_output() {
        let a = domain_separated_hash("vaultline state v1", b"payload");
        let b = domain_separated_hash("vaultline receipt v1", b"payload");
        assert_ne!(a, b);
    }
}
