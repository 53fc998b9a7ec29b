//! # Identity Module
//!
//! Who is acting, and where things live.
//!
//! 1. **Address** — 32-byte identifier for every record, mint and token
//!    account. Key addresses come from public keys; derived addresses do not.
//! 2. **Derivation** — the pure `(domain tag, parents) -> address` function.
//!    No registry, no lookup table: the same inputs always give the same
//!    address, on any machine.
//! 3. **Signer** — an authenticated principal. The only thing that can
//!    authorize a mutation.

pub mod address;
pub mod derivation;
pub mod signer;

pub use address::{Address, AddressError};
pub use derivation::{
    associated_account_address, branch_address, capability_address, claim_asset_address,
    controller_address, create_derived_address, find_derived_address, program_id, state_address,
    token_program_id, DerivationError,
};
pub use signer::{signing_digest, Signer};
