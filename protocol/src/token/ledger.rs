//! # Asset Ledger Interface
//!
//! The accounting core never moves tokens itself. It calls a fungible-asset
//! ledger through [`AssetLedger`]: create a mint, create an account, mint,
//! burn, transfer. Each call is atomic on its own and reports failure to the
//! caller.
//!
//! Authority is explicit on every mutating call. The ledger compares it
//! against the mint authority (for `mint`) or the account owner (for `burn`
//! and `transfer`). Callers outside the core reach the ledger through
//! [`TokenClient`](super::TokenClient), which pins the authority to the
//! caller's own signer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{associated_account_address, Address, DerivationError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by an asset ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("mint not found: {0}")]
    MintNotFound(Address),

    #[error("token account not found: {0}")]
    AccountNotFound(Address),

    #[error("address already in use: {0}")]
    AddressInUse(Address),

    #[error("account {account} holds {actual}, expected {expected}")]
    AssetMismatch {
        /// The token account.
        account: Address,
        /// The asset the caller named.
        expected: Address,
        /// The asset the account actually holds.
        actual: Address,
    },

    #[error("authority {0} may not mint this asset")]
    InvalidMintAuthority(Address),

    #[error("authority {authority} does not own account {account}")]
    InvalidOwner {
        /// The token account.
        account: Address,
        /// The authority that was presented.
        authority: Address,
    },

    #[error("insufficient funds in {account}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// The debited account.
        account: Address,
        /// Its balance.
        balance: u64,
        /// Requested debit.
        amount: u64,
    },

    #[error("arithmetic overflow crediting {amount}")]
    Overflow {
        /// The amount that could not be added.
        amount: u64,
    },

    #[error("derivation failed: {0}")]
    Derivation(#[from] DerivationError),
}

/// Result alias for ledger calls.
pub type TokenResult<T> = Result<T, TokenError>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A fungible asset definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    /// The mint's own address; this is the asset identifier.
    pub address: Address,
    /// Display precision. Arithmetic is always in base units.
    pub decimals: u8,
    /// Outstanding supply in base units.
    pub supply: u64,
    /// The only authority allowed to mint new supply.
    pub authority: Address,
}

/// A balance of one asset owned by one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    /// The account's address.
    pub address: Address,
    /// Which asset it holds.
    pub asset: Address,
    /// Who may debit it.
    pub owner: Address,
    /// Balance in base units.
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The fungible-asset ledger collaborator.
pub trait AssetLedger {
    /// Register a new asset at `mint`.
    fn create_mint(&mut self, mint: Address, decimals: u8, authority: Address) -> TokenResult<()>;

    /// Open an empty account at `account` holding `asset` for `owner`.
    fn create_account(&mut self, account: Address, owner: Address, asset: Address)
        -> TokenResult<()>;

    /// Issue `amount` new units of `asset` into `destination`.
    fn mint(
        &mut self,
        asset: &Address,
        destination: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()>;

    /// Destroy `amount` units of `asset` held in `source`.
    fn burn(
        &mut self,
        asset: &Address,
        source: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()>;

    /// Move `amount` units of `asset` from `source` to `destination`.
    fn transfer(
        &mut self,
        asset: &Address,
        source: &Address,
        destination: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()>;

    /// Look up a mint.
    fn mint_info(&self, asset: &Address) -> Option<&Mint>;

    /// Look up a token account.
    fn account(&self, account: &Address) -> Option<&TokenAccount>;

    /// The single account holding the entire outstanding supply of `asset`,
    /// if there is one. For a one-unit capability this is its current holder.
    fn holder_of(&self, asset: &Address) -> Option<&TokenAccount>;

    /// Balance of `account`, zero if it does not exist.
    fn balance(&self, account: &Address) -> u64 {
        self.account(account).map(|a| a.amount).unwrap_or(0)
    }

    /// Whether `address` is taken by a mint or an account.
    fn is_occupied(&self, address: &Address) -> bool {
        self.mint_info(address).is_some() || self.account(address).is_some()
    }

    /// Open the associated account of `owner` for `asset` and return its address.
    fn create_associated_account(&mut self, owner: &Address, asset: &Address) -> TokenResult<Address> {
        let address = associated_account_address(owner, asset)?;
        self.create_account(address, *owner, *asset)?;
        Ok(address)
    }
}
