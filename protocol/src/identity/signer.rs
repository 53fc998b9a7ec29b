//! # Authenticated Signers
//!
//! A [`Signer`] is proof that a principal authorized the current operation.
//! It can only be obtained two ways:
//!
//! 1. From a [`Keypair`] the caller holds ([`Signer::from_keypair`]).
//! 2. From a public key plus a valid signature over a message
//!    ([`Signer::verify`]).
//!
//! Messages are never signed raw. [`Signer::sign_message`] and
//! [`Signer::verify`] both work on [`signing_digest`], a BLAKE3 digest keyed
//! by [`SIGNER_CONTEXT`], so a signature made for some other purpose cannot
//! authenticate a signer here.
//!
//! There is no constructor from a bare [`Address`]. Operations take
//! `&Signer`, so "no signer" is unrepresentable and "wrong signer" is a
//! comparison against stored or capability-held identity.

use super::address::Address;
use crate::config::SIGNER_CONTEXT;
use crate::crypto::hash::domain_separated_hash;
use crate::crypto::keys::{KeyError, Keypair, PublicKey, Signature};

/// The digest actually signed for `message`.
pub fn signing_digest(message: &[u8]) -> [u8; 32] {
    domain_separated_hash(SIGNER_CONTEXT, message)
}

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    public_key: PublicKey,
}

impl Signer {
    /// The holder of `keypair` signs directly.
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            public_key: keypair.public_key(),
        }
    }

    /// Sign `message` for later [`Signer::verify`].
    pub fn sign_message(keypair: &Keypair, message: &[u8]) -> Signature {
        keypair.sign(&signing_digest(message))
    }

    /// Authenticate `public_key` by checking its signature over `message`.
    pub fn verify(
        public_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<Self, KeyError> {
        public_key.verify(&signing_digest(message), signature)?;
        Ok(Self {
            public_key: *public_key,
        })
    }

    /// The address this signer speaks for.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// The signer's public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Whether this signer is the principal stored at `address`.
    pub fn is(&self, address: &Address) -> bool {
        self.address() == *address
    }
}

impl From<&Keypair> for Signer {
    fn from(keypair: &Keypair) -> Self {
        Self::from_keypair(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_signer_speaks_for_its_address() {
        let kp = Keypair::generate();
        let signer = Signer::from_keypair(&kp);
        assert!(signer.is(&Address::from(kp.public_key())));
        assert!(!signer.is(&Address::default()));
    }

    #[test]
    fn verified_signer_requires_valid_signature() {
        let kp = Keypair::generate();
        let sig = Signer::sign_message(&kp, b"close branch");
        let signer = Signer::verify(&kp.public_key(), b"close branch", &sig).unwrap();
        assert_eq!(signer.public_key(), &kp.public_key());

        let other = Keypair::generate();
        assert!(Signer::verify(&other.public_key(), b"close branch", &sig).is_err());
        assert!(Signer::verify(&kp.public_key(), b"open branch", &sig).is_err());
    }

    #[test]
    fn raw_signature_does_not_authenticate() {
        let kp = Keypair::generate();
        let raw = kp.sign(b"close branch");
        assert!(Signer::verify(&kp.public_key(), b"close branch", &raw).is_err());

        // Nor does a signature over the digest of a different message.
        let digest_sig = kp.sign(&signing_digest(b"open branch"));
        assert!(Signer::verify(&kp.public_key(), b"close branch", &digest_sig).is_err());
    }
}
