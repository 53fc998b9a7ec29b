//! # Key Management
//!
//! Ed25519 keypairs for the principals that sign Vaultline operations:
//! platform admins, vault owners, capability holders and claim holders.
//!
//! Derived addresses (GlobalState, branches, mints) deliberately have no
//! keypair. Only principals with a [`Keypair`] can produce a
//! [`Signer`](crate::identity::Signer), and only a `Signer` can authorize a
//! mutation.
//!
//! Key bytes are never logged.

use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::config::SIGNATURE_LENGTH;

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// An Ed25519 keypair owned by a signing principal.
///
/// Intentionally not `Serialize`: exporting secret material goes through
/// [`Keypair::to_hex`] so it is always a deliberate act.
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of a keypair. This is what appears in signed instructions.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Tests and fixtures use this
    /// so that addresses are stable across runs.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Export the secret as hex. Handle with care.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// The public key for this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Ed25519 signatures are deterministic.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature).is_ok()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only.
        write!(f, "Keypair(pub={})", self.public_key())
    }
}

impl PublicKey {
    /// Wrap raw bytes without curve validation. Use [`PublicKey::try_from_slice`]
    /// for untrusted input.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse and validate untrusted bytes as an Ed25519 point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        let sig = signature.to_dalek().ok_or(KeyError::InvalidSignature)?;
        verifying_key
            .verify_strict(message, &sig)
            .map_err(|_| KeyError::VerificationFailed)
    }

    /// Hex-encoded representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Base58-encoded representation, the same alphabet addresses use.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base58())
    }
}

impl Signature {
    /// Wrap a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw bytes. Always 64 for signatures produced by [`Keypair::sign`].
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    fn to_dalek(&self) -> Option<DalekSignature> {
        let arr: [u8; SIGNATURE_LENGTH] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"open vault");
        assert!(kp.verify(b"open vault", &sig));
        assert!(!kp.verify(b"open branch", &sig));
    }

    #[test]
    fn seeded_keypairs_are_deterministic() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign(b"m"), b.sign(b"m"));
    }

    #[test]
    fn hex_export_and_import() {
        let kp = Keypair::generate();
        let restored = Keypair::from_hex(&kp.to_hex()).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(Keypair::from_hex("abcd").is_err());
        assert!(Keypair::from_hex("zz").is_err());
    }

    #[test]
    fn verify_with_other_key_fails() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let sig = alice.sign(b"pay 100");
        assert!(matches!(
            bob.public_key().verify(b"pay 100", &sig),
            Err(KeyError::VerificationFailed)
        ));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let kp = Keypair::generate();
        let sig = Signature {
            bytes: kp.sign(b"m").as_bytes()[..32].to_vec(),
        };
        assert!(matches!(
            kp.public_key().verify(b"m", &sig),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn try_from_slice_validates_length() {
        assert!(PublicKey::try_from_slice(&[1u8; 31]).is_err());
        let kp = Keypair::generate();
        let pk = PublicKey::try_from_slice(kp.public_key().as_bytes()).unwrap();
        assert_eq!(pk, kp.public_key());
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = Keypair::generate();
        let dbg = format!("{kp:?}");
        assert!(!dbg.contains(&kp.to_hex()));
    }
}
