//! # Address Derivation
//!
//! Deterministic, registry-free addressing. A derived address is a pure
//! function of a list of seeds (a domain tag followed by parent identifiers)
//! and the identifier of the program that owns it:
//!
//! ```text
//! candidate(bump) = SHA-256( for seed in seeds ++ [[bump]]: len(seed) || seed
//!                            || program_id
//!                            || "VaultlineDerivedAddress" )
//! ```
//!
//! [`find_derived_address`] walks `bump` from 255 down to 0 and returns the
//! first candidate that is *not* a valid Ed25519 point. Nobody holds a
//! private key for such an address, so only the owning program can act for
//! it. The one-byte length prefix on every seed makes the preimage injective:
//! `["ab", "c"]` and `["a", "bc"]` hash different bytes.

use thiserror::Error;

use super::address::Address;
use crate::config::{
    ASSOCIATED_ACCOUNT_SEED, BRANCH_SEED, CAPABILITY_MINT_SEED, CLAIM_MINT_SEED, CONTROLLER_SEED,
    DERIVED_ADDRESS_MARKER, MAX_SEEDS, MAX_SEED_LEN, PROGRAM_ID_SEED, STATE_SEED,
    TOKEN_PROGRAM_ID_SEED,
};
use crate::crypto::hash::{sha256, sha256_multi};

/// Errors from address derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("too many seeds: {count} exceeds the maximum of {MAX_SEEDS}", MAX_SEEDS = MAX_SEEDS)]
    TooManySeeds {
        /// Number of seeds supplied (bump included).
        count: usize,
    },

    #[error("seed {index} is {len} bytes, maximum is {MAX_SEED_LEN}", MAX_SEED_LEN = MAX_SEED_LEN)]
    SeedTooLong {
        /// Position of the offending seed.
        index: usize,
        /// Its length.
        len: usize,
    },

    #[error("derived address lies on the ed25519 curve")]
    OnCurve,

    #[error("no bump in 0..=255 yields an off-curve address")]
    NoViableBump,
}

/// The core program's identifier.
pub fn program_id() -> Address {
    Address::new(sha256(PROGRAM_ID_SEED.as_bytes()))
}

/// The asset ledger's identifier, used for associated token accounts.
pub fn token_program_id() -> Address {
    Address::new(sha256(TOKEN_PROGRAM_ID_SEED.as_bytes()))
}

/// Derive the address for `seeds` exactly as given (the caller appends the
/// bump). Fails with [`DerivationError::OnCurve`] if the result has a keypair.
pub fn create_derived_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<Address, DerivationError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DerivationError::TooManySeeds { count: seeds.len() });
    }

    let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() * 2 + 2);
    let mut prefixes = [[0u8; 1]; MAX_SEEDS];
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DerivationError::SeedTooLong {
                index,
                len: seed.len(),
            });
        }
        prefixes[index][0] = seed.len() as u8;
    }
    for (index, seed) in seeds.iter().enumerate() {
        parts.push(&prefixes[index]);
        parts.push(seed);
    }
    parts.push(program_id.as_bytes());
    parts.push(DERIVED_ADDRESS_MARKER);

    let address = Address::new(sha256_multi(&parts));
    if address.is_on_curve() {
        return Err(DerivationError::OnCurve);
    }
    Ok(address)
}

/// Find the canonical (highest-bump) off-curve address for `seeds`.
pub fn find_derived_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), DerivationError> {
    if seeds.len() + 1 > MAX_SEEDS {
        return Err(DerivationError::TooManySeeds {
            count: seeds.len() + 1,
        });
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_derived_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(DerivationError::OnCurve) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(DerivationError::NoViableBump)
}

// ---------------------------------------------------------------------------
// Named derivations
// ---------------------------------------------------------------------------

/// GlobalState singleton.
pub fn state_address() -> Result<(Address, u8), DerivationError> {
    find_derived_address(&[STATE_SEED], &program_id())
}

/// Claim-asset mint. Its mint authority is [`state_address`].
pub fn claim_asset_address() -> Result<(Address, u8), DerivationError> {
    find_derived_address(&[CLAIM_MINT_SEED], &program_id())
}

/// Reserve controller custody account for a given reserve asset.
pub fn controller_address(reserve_asset: &Address) -> Result<(Address, u8), DerivationError> {
    find_derived_address(&[CONTROLLER_SEED, reserve_asset.as_ref()], &program_id())
}

/// Branch under `vault`. Without a salt every vault has exactly one branch
/// slot; a salt opens further, independent slots.
pub fn branch_address(vault: &Address, salt: Option<u64>) -> Result<(Address, u8), DerivationError> {
    match salt {
        None => find_derived_address(&[BRANCH_SEED, vault.as_ref()], &program_id()),
        Some(salt) => {
            let salt_bytes = salt.to_le_bytes();
            find_derived_address(&[BRANCH_SEED, vault.as_ref(), &salt_bytes], &program_id())
        }
    }
}

/// Ownership capability mint for `branch`.
pub fn capability_address(branch: &Address) -> Result<(Address, u8), DerivationError> {
    find_derived_address(&[CAPABILITY_MINT_SEED, branch.as_ref()], &program_id())
}

/// Associated token account of `owner` for `asset`, under the ledger's
/// program identifier.
pub fn associated_account_address(
    owner: &Address,
    asset: &Address,
) -> Result<Address, DerivationError> {
    find_derived_address(
        &[owner.as_ref(), ASSOCIATED_ACCOUNT_SEED, asset.as_ref()],
        &token_program_id(),
    )
    .map(|(address, _)| address)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
