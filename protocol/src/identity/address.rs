//! # Addresses
//!
//! Every record, mint and token account in Vaultline is named by a 32-byte
//! [`Address`]. Two kinds exist side by side:
//!
//! - **Key addresses** — the raw bytes of an Ed25519 public key. These are
//!   the only addresses a [`Signer`](super::Signer) can speak for.
//! - **Derived addresses** — produced by [`derivation`](super::derivation)
//!   and guaranteed to lie off the Ed25519 curve, so no keypair exists for
//!   them.
//!
//! Addresses display as base58, which is shorter than hex and avoids the
//! visually ambiguous characters `0`, `O`, `I` and `l`.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_LENGTH;
use crate::crypto::keys::PublicKey;

/// Errors from parsing an address string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 address: {0}")]
    InvalidBase58(String),

    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Decoded length.
        got: usize,
    },
}

/// A 32-byte account identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The key address for a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(*public_key.as_bytes())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Whether these bytes decode to a point on the Ed25519 curve. Key
    /// addresses always do; derived addresses never do.
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// Base58 encoding.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl From<PublicKey> for Address {
    fn from(public_key: PublicKey) -> Self {
        Self::from_public_key(&public_key)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        let arr: [u8; ADDRESS_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_base58();
        write!(f, "Address({})", &encoded[..encoded.len().min(12)])
    }
}
