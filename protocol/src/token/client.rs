//! # Signer-Gated Token Client
//!
//! What a principal outside the core can do with the asset ledger. Every
//! call uses the client's signer as the authority, so nobody can move funds
//! out of an account they do not own, and nobody can act for a derived
//! address (those have no keypair and so no [`Signer`]).

use tracing::debug;

use super::ledger::{AssetLedger, TokenResult};
use crate::identity::{Address, Signer};

/// A view of an [`AssetLedger`] acting as one signer.
pub struct TokenClient<'a, L: AssetLedger + ?Sized> {
    ledger: &'a mut L,
    signer: &'a Signer,
}

impl<'a, L: AssetLedger + ?Sized> TokenClient<'a, L> {
    pub fn new(ledger: &'a mut L, signer: &'a Signer) -> Self {
        Self { ledger, signer }
    }

    /// The acting principal.
    pub fn signer(&self) -> &Signer {
        self.signer
    }

    /// Register a new asset. The mint's own key must co-sign, which keeps
    /// anyone from squatting a derived address. The client's signer becomes
    /// mint authority.
    pub fn create_mint(&mut self, mint: &Signer, decimals: u8) -> TokenResult<Address> {
        let address = mint.address();
        self.ledger
            .create_mint(address, decimals, self.signer.address())?;
        debug!(mint = %address, authority = %self.signer.address(), "client created mint");
        Ok(address)
    }

    /// Open a keypair-addressed account for `owner`. The account's key must sign.
    pub fn create_account_at(
        &mut self,
        account: &Signer,
        owner: &Address,
        asset: &Address,
    ) -> TokenResult<Address> {
        let address = account.address();
        self.ledger.create_account(address, *owner, *asset)?;
        Ok(address)
    }

    /// Open the associated account of `owner` for `asset`. Anyone may pay
    /// for this; the address is fixed by derivation.
    pub fn create_associated(&mut self, owner: &Address, asset: &Address) -> TokenResult<Address> {
        self.ledger.create_associated_account(owner, asset)
    }

    /// Open the signer's own associated account for `asset`.
    pub fn create_own_associated(&mut self, asset: &Address) -> TokenResult<Address> {
        let owner = self.signer.address();
        self.ledger.create_associated_account(&owner, asset)
    }

    /// Issue new units. Only works if the signer is mint authority.
    pub fn mint_to(&mut self, asset: &Address, destination: &Address, amount: u64) -> TokenResult<()> {
        let authority = self.signer.address();
        self.ledger.mint(asset, destination, amount, &authority)
    }

    /// Move units out of an account the signer owns.
    pub fn transfer(
        &mut self,
        asset: &Address,
        source: &Address,
        destination: &Address,
        amount: u64,
    ) -> TokenResult<()> {
        let authority = self.signer.address();
        self.ledger
            .transfer(asset, source, destination, amount, &authority)
    }

    /// Destroy units from an account the signer owns.
    pub fn burn(&mut self, asset: &Address, source: &Address, amount: u64) -> TokenResult<()> {
        let authority = self.signer.address();
        self.ledger.burn(asset, source, amount, &authority)
    }

    /// Balance of any account.
    pub fn balance(&self, account: &Address) -> u64 {
        self.ledger.balance(account)
    }
}
