//! # In-Memory Token Ledger
//!
//! The reference [`AssetLedger`]: mints and accounts in ordered maps, plus a
//! holders index (`mint -> accounts with a nonzero balance`) so that
//! [`AssetLedger::holder_of`] is a lookup rather than a scan.
//!
//! Every mutating call validates first and writes last, so a failed call
//! leaves the ledger untouched.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::ledger::{AssetLedger, Mint, TokenAccount, TokenError, TokenResult};
use crate::identity::Address;

/// Mints, accounts and the holders index.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    mints: BTreeMap<Address, Mint>,
    accounts: BTreeMap<Address, TokenAccount>,
    /// Accounts with a nonzero balance, per mint.
    holders: BTreeMap<Address, BTreeSet<Address>>,
}

impl TokenLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted mints and accounts. The holders index
    /// is derived, never stored.
    pub fn from_parts(
        mints: impl IntoIterator<Item = Mint>,
        accounts: impl IntoIterator<Item = TokenAccount>,
    ) -> Self {
        let mut ledger = Self::new();
        for mint in mints {
            ledger.mints.insert(mint.address, mint);
        }
        for account in accounts {
            if account.amount > 0 {
                ledger
                    .holders
                    .entry(account.asset)
                    .or_default()
                    .insert(account.address);
            }
            ledger.accounts.insert(account.address, account);
        }
        ledger
    }

    /// All mints, ordered by address.
    pub fn mints(&self) -> impl Iterator<Item = &Mint> {
        self.mints.values()
    }

    /// All token accounts, ordered by address.
    pub fn accounts(&self) -> impl Iterator<Item = &TokenAccount> {
        self.accounts.values()
    }

    /// Number of token accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Total supply of `asset`, zero if unknown.
    pub fn total_supply(&self, asset: &Address) -> u64 {
        self.mints.get(asset).map(|m| m.supply).unwrap_or(0)
    }

    fn account_for(&self, asset: &Address, account: &Address) -> TokenResult<&TokenAccount> {
        let found = self
            .accounts
            .get(account)
            .ok_or(TokenError::AccountNotFound(*account))?;
        if found.asset != *asset {
            return Err(TokenError::AssetMismatch {
                account: *account,
                expected: *asset,
                actual: found.asset,
            });
        }
        Ok(found)
    }

    fn check_owner(account: &TokenAccount, authority: &Address) -> TokenResult<()> {
        if account.owner != *authority {
            return Err(TokenError::InvalidOwner {
                account: account.address,
                authority: *authority,
            });
        }
        Ok(())
    }

    fn check_debit(account: &TokenAccount, amount: u64) -> TokenResult<u64> {
        account
            .amount
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientFunds {
                account: account.address,
                balance: account.amount,
                amount,
            })
    }

    /// Write a new balance and keep the holders index in step.
    fn set_amount(&mut self, account: &Address, amount: u64) {
        if let Some(entry) = self.accounts.get_mut(account) {
            entry.amount = amount;
            let holders = self.holders.entry(entry.asset).or_default();
            if amount > 0 {
                holders.insert(*account);
            } else {
                holders.remove(account);
            }
        }
    }
}

impl AssetLedger for TokenLedger {
    fn create_mint(&mut self, mint: Address, decimals: u8, authority: Address) -> TokenResult<()> {
        if self.is_occupied(&mint) {
            return Err(TokenError::AddressInUse(mint));
        }
        self.mints.insert(
            mint,
            Mint {
                address: mint,
                decimals,
                supply: 0,
                authority,
            },
        );
        debug!(%mint, decimals, %authority, "mint created");
        Ok(())
    }

    fn create_account(
        &mut self,
        account: Address,
        owner: Address,
        asset: Address,
    ) -> TokenResult<()> {
        if !self.mints.contains_key(&asset) {
            return Err(TokenError::MintNotFound(asset));
        }
        if self.is_occupied(&account) {
            return Err(TokenError::AddressInUse(account));
        }
        self.accounts.insert(
            account,
            TokenAccount {
                address: account,
                asset,
                owner,
                amount: 0,
            },
        );
        debug!(%account, %owner, %asset, "token account created");
        Ok(())
    }

    fn mint(
        &mut self,
        asset: &Address,
        destination: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()> {
        let mint = self
            .mints
            .get(asset)
            .ok_or(TokenError::MintNotFound(*asset))?;
        if mint.authority != *authority {
            return Err(TokenError::InvalidMintAuthority(*authority));
        }
        let new_supply = mint
            .supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;
        let dest = self.account_for(asset, destination)?;
        let new_amount = dest
            .amount
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;

        if let Some(mint) = self.mints.get_mut(asset) {
            mint.supply = new_supply;
        }
        self.set_amount(destination, new_amount);
        debug!(%asset, %destination, amount, supply = new_supply, "minted");
        Ok(())
    }

    fn burn(
        &mut self,
        asset: &Address,
        source: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()> {
        let mint = self
            .mints
            .get(asset)
            .ok_or(TokenError::MintNotFound(*asset))?;
        let src = self.account_for(asset, source)?;
        Self::check_owner(src, authority)?;
        let new_amount = Self::check_debit(src, amount)?;
        // An account balance never exceeds supply, so this cannot underflow.
        let new_supply = mint.supply.saturating_sub(amount);

        if let Some(mint) = self.mints.get_mut(asset) {
            mint.supply = new_supply;
        }
        self.set_amount(source, new_amount);
        debug!(%asset, %source, amount, supply = new_supply, "burned");
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &Address,
        source: &Address,
        destination: &Address,
        amount: u64,
        authority: &Address,
    ) -> TokenResult<()> {
        let src = self.account_for(asset, source)?;
        Self::check_owner(src, authority)?;
        let new_source = Self::check_debit(src, amount)?;
        let dest = self.account_for(asset, destination)?;

        if source == destination {
            return Ok(());
        }
        let new_dest = dest
            .amount
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;

        self.set_amount(source, new_source);
        self.set_amount(destination, new_dest);
        debug!(%asset, %source, %destination, amount, "transferred");
        Ok(())
    }

    fn mint_info(&self, asset: &Address) -> Option<&Mint> {
        self.mints.get(asset)
    }

    fn account(&self, account: &Address) -> Option<&TokenAccount> {
        self.accounts.get(account)
    }

    fn holder_of(&self, asset: &Address) -> Option<&TokenAccount> {
        let supply = self.mints.get(asset)?.supply;
        let holders = self.holders.get(asset)?;
        if holders.len() != 1 {
            return None;
        }
        let account = holders.iter().next().and_then(|a| self.accounts.get(a))?;
        (account.amount == supply).then_some(account)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
