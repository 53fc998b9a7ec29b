//! # Swap Engine
//!
//! Redeem claim-asset units one-for-one against the reserve. The signer's
//! claim units are burned and the same amount of reserve asset moves from
//! the controller to the recipient. Vault and branch records are not
//! touched.

use tracing::info;

use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::token::AssetLedger;

use super::logged;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

/// Balances after a successful swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapReceipt {
    pub amount: u64,
    pub settle_balance: u64,
    pub controller_balance: u64,
    pub recipient_balance: u64,
}

impl<L: AssetLedger> Ledger<L> {
    /// Burn `amount` claim units from `settle_account` (owned by the signer)
    /// and pay `amount` reserve units from the controller to
    /// `recipient_account`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] for zero.
    /// - [`LedgerError::NotFound`] if uninitialized or an account is missing.
    /// - [`LedgerError::InvalidAccountLink`] if an account holds the wrong asset.
    /// - [`LedgerError::Unauthorized`] if the signer does not own the settle account.
    /// - [`LedgerError::InsufficientBalance`] if the settle account is short.
    /// - [`LedgerError::InsufficientReserve`] if the controller is short.
    /// - [`LedgerError::ArithmeticOverflow`] if the recipient credit overflows.
    pub fn swap(
        &mut self,
        amount: u64,
        signer: &Signer,
        settle_account: &Address,
        recipient_account: &Address,
    ) -> LedgerResult<SwapReceipt> {
        let result = self.try_swap(amount, signer, settle_account, recipient_account);
        logged("swap", result)
    }

    fn try_swap(
        &mut self,
        amount: u64,
        signer: &Signer,
        settle_account: &Address,
        recipient_account: &Address,
    ) -> LedgerResult<SwapReceipt> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let (state_id, state) = self.require_global_state()?;

        let settle = self
            .tokens
            .account(settle_account)
            .ok_or_else(|| LedgerError::not_found("settle account", *settle_account))?;
        if settle.asset != state.claim_asset {
            return Err(LedgerError::InvalidAccountLink(format!(
                "settle account {settle_account} holds {}, not the claim asset",
                settle.asset
            )));
        }
        if !signer.is(&settle.owner) {
            return Err(LedgerError::unauthorized(
                signer.address(),
                "redeem from an account it does not own",
            ));
        }

        let recipient = self
            .tokens
            .account(recipient_account)
            .ok_or_else(|| LedgerError::not_found("recipient account", *recipient_account))?;
        if recipient.asset != state.reserve_asset {
            return Err(LedgerError::InvalidAccountLink(format!(
                "recipient {recipient_account} holds {}, not the reserve asset",
                recipient.asset
            )));
        }

        if settle.amount < amount {
            return Err(LedgerError::InsufficientBalance {
                available: settle.amount,
                requested: amount,
            });
        }
        let controller = self
            .tokens
            .account(&state.controller)
            .ok_or_else(|| LedgerError::not_found("reserve controller", state.controller))?;
        if controller.amount < amount {
            return Err(LedgerError::InsufficientReserve {
                available: controller.amount,
                requested: amount,
            });
        }
        let settle_balance = settle.amount - amount;
        // Paying the controller into itself moves nothing.
        let (controller_balance, recipient_balance) = if *recipient_account == state.controller {
            (controller.amount, controller.amount)
        } else {
            let credited = recipient
                .amount
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow("recipient balance"))?;
            (controller.amount - amount, credited)
        };

        self.tokens
            .burn(&state.claim_asset, settle_account, amount, &signer.address())?;
        self.tokens.transfer(
            &state.reserve_asset,
            &state.controller,
            recipient_account,
            amount,
            &state_id,
        )?;

        info!(
            amount,
            settle = %settle_account,
            recipient = %recipient_account,
            controller_balance,
            "claim redeemed"
        );
        Ok(SwapReceipt {
            amount,
            settle_balance,
            controller_balance,
            recipient_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use vaultline_protocol::crypto::keys::Keypair;
    use vaultline_protocol::token::{TokenClient, TokenLedger};

    struct Fixture {
        ledger: Ledger,
        holder: Signer,
        settle: Address,
        recipient: Address,
        controller: Address,
    }

    /// Initialized ledger with `reserve` units in the controller and `claim`
    /// units paid to `holder`'s settle account.
    fn fixture(reserve: u64, claim: u64) -> Fixture {
        let mut tokens = TokenLedger::new();
        let issuer = Signer::from(&Keypair::generate());
        let reserve_asset = TokenClient::new(&mut tokens, &issuer)
            .create_mint(&Signer::from(&Keypair::generate()), 6)
            .unwrap();
        let mut ledger: Ledger = Ledger::new(tokens);
        let state = ledger
            .initialize(&Signer::from(&Keypair::generate()), &reserve_asset)
            .unwrap();
        if reserve > 0 {
            ledger
                .token_client(&issuer)
                .mint_to(&reserve_asset, &state.controller, reserve)
                .unwrap();
        }

        let holder = Signer::from(&Keypair::generate());
        let settle = ledger
            .token_client(&holder)
            .create_own_associated(&state.claim_asset)
            .unwrap();
        let recipient = ledger
            .token_client(&holder)
            .create_own_associated(&reserve_asset)
            .unwrap();

        if claim > 0 {
            let admin = Signer::from(&Keypair::generate());
            let vault = Address::from(Keypair::generate().public_key());
            ledger
                .open_vault(&admin, &vault, &Address::from(Keypair::generate().public_key()))
                .unwrap();
            let opened = ledger.open_branch(&admin, &vault).unwrap();
            ledger
                .pay(claim, &admin, &vault, &opened.branch, &settle)
                .unwrap();
        }

        Fixture {
            ledger,
            holder,
            settle,
            recipient,
            controller: state.controller,
        }
    }

    #[test]
    fn swap_burns_claim_and_releases_reserve() {
        let mut f = fixture(1_000, 100);
        let receipt = f
            .ledger
            .swap(60, &f.holder, &f.settle, &f.recipient)
            .unwrap();
        assert_eq!(receipt.settle_balance, 40);
        assert_eq!(receipt.controller_balance, 940);
        assert_eq!(receipt.recipient_balance, 60);
        assert_eq!(f.ledger.balance_of(&f.settle), 40);
        assert_eq!(f.ledger.balance_of(&f.controller), 940);
        assert_eq!(f.ledger.balance_of(&f.recipient), 60);
        let claim = f.ledger.global_state().unwrap().claim_asset;
        assert_eq!(f.ledger.tokens().total_supply(&claim), 40);
    }

    #[test]
    fn swap_exact_balances_succeeds() {
        let mut f = fixture(50, 50);
        f.ledger.swap(50, &f.holder, &f.settle, &f.recipient).unwrap();
        assert_eq!(f.ledger.balance_of(&f.controller), 0);
        assert_eq!(f.ledger.balance_of(&f.settle), 0);
    }

    #[test]
    fn swap_fails_on_short_reserve() {
        let mut f = fixture(10, 100);
        let err = f
            .ledger
            .swap(60, &f.holder, &f.settle, &f.recipient)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientReserve {
                available: 10,
                requested: 60
            }
        );
        assert_eq!(f.ledger.balance_of(&f.settle), 100);
        assert_eq!(f.ledger.balance_of(&f.controller), 10);
    }

    #[test]
    fn swap_fails_on_short_settle() {
        let mut f = fixture(1_000, 30);
        let err = f
            .ledger
            .swap(31, &f.holder, &f.settle, &f.recipient)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(f.ledger.balance_of(&f.controller), 1_000);
    }

    #[test]
    fn swap_requires_settle_owner() {
        let mut f = fixture(1_000, 100);
        let thief = Signer::from(&Keypair::generate());
        let err = f
            .ledger
            .swap(10, &thief, &f.settle, &f.recipient)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(f.ledger.balance_of(&f.settle), 100);
    }

    #[test]
    fn swap_rejects_swapped_accounts() {
        let mut f = fixture(1_000, 100);
        let err = f
            .ledger
            .swap(10, &f.holder, &f.recipient, &f.settle)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccountLink);
    }

    #[test]
    fn swap_before_initialize_is_not_found() {
        let mut ledger: Ledger = Ledger::new(TokenLedger::new());
        let holder = Signer::from(&Keypair::generate());
        let err = ledger
            .swap(1, &holder, &Address::new([1u8; 32]), &Address::new([2u8; 32]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
