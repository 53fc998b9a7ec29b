//! One-time platform setup.

use tracing::info;

use vaultline_protocol::config::CLAIM_ASSET_DECIMALS;
use vaultline_protocol::identity::{
    claim_asset_address, controller_address, state_address, Address, Signer,
};
use vaultline_protocol::token::AssetLedger;

use super::logged;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::state::{GlobalState, Record};

impl<L: AssetLedger> Ledger<L> {
    /// Create GlobalState, the claim-asset mint and the reserve controller.
    ///
    /// The signer becomes platform admin. The claim mint's authority is the
    /// GlobalState address, and the controller account is owned by it, so
    /// neither can be driven by any external key.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AlreadyInitialized`] on a second call.
    /// - [`LedgerError::NotFound`] if `reserve_asset` is not a known mint.
    /// - [`LedgerError::Conflict`] if the claim mint or controller address
    ///   is already occupied.
    pub fn initialize(
        &mut self,
        signer: &Signer,
        reserve_asset: &Address,
    ) -> LedgerResult<GlobalState> {
        let result = self.try_initialize(signer, reserve_asset);
        logged("initialize", result)
    }

    fn try_initialize(
        &mut self,
        signer: &Signer,
        reserve_asset: &Address,
    ) -> LedgerResult<GlobalState> {
        let (state, bump) = state_address()?;
        if self.records.contains_key(&state) {
            return Err(LedgerError::AlreadyInitialized);
        }
        if self.tokens.mint_info(reserve_asset).is_none() {
            return Err(LedgerError::not_found("reserve asset", *reserve_asset));
        }

        let (claim_asset, _) = claim_asset_address()?;
        let (controller, _) = controller_address(reserve_asset)?;
        for address in [state, claim_asset, controller] {
            if self.is_taken(&address) {
                return Err(LedgerError::conflict(address, "address already in use"));
            }
        }

        self.tokens
            .create_mint(claim_asset, CLAIM_ASSET_DECIMALS, state)?;
        self.tokens
            .create_account(controller, state, *reserve_asset)?;

        let global = GlobalState {
            admin: signer.address(),
            claim_asset,
            reserve_asset: *reserve_asset,
            controller,
            bump,
        };
        self.records.insert(state, Record::GlobalState(global.clone()));

        info!(
            admin = %global.admin,
            %claim_asset,
            reserve_asset = %global.reserve_asset,
            %controller,
            "ledger initialized"
        );
        Ok(global)
    }
}
