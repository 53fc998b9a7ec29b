//! # Payment Engine
//!
//! `pay` issues new claim-asset units to a recipient and attributes them to
//! a branch and its vault. Payment rights follow the branch capability: the
//! signer must own whichever account holds the capability's single unit at
//! the moment of the call. Transferring the capability through the asset
//! ledger transfers the right to pay.

use tracing::info;

use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::token::AssetLedger;

use super::logged;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

/// Balances after a successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub amount: u64,
    pub vault_balance: u64,
    pub branch_balance: u64,
    pub recipient_balance: u64,
}

impl<L: AssetLedger> Ledger<L> {
    /// Pay `amount` claim-asset units into `recipient_account`, crediting
    /// `branch_id` and `vault_id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] for zero.
    /// - [`LedgerError::NotFound`] if the ledger is uninitialized or a record
    ///   or the recipient account is missing.
    /// - [`LedgerError::InvalidAccountLink`] if the branch is not under the
    ///   vault or the recipient does not hold the claim asset.
    /// - [`LedgerError::Unauthorized`] unless the signer holds the capability.
    /// - [`LedgerError::ArithmeticOverflow`] if any credit would overflow.
    pub fn pay(
        &mut self,
        amount: u64,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
        recipient_account: &Address,
    ) -> LedgerResult<PaymentReceipt> {
        let result = self.try_pay(amount, signer, vault_id, branch_id, recipient_account);
        logged("pay", result)
    }

    fn try_pay(
        &mut self,
        amount: u64,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
        recipient_account: &Address,
    ) -> LedgerResult<PaymentReceipt> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let (state_id, state) = self.require_global_state()?;

        let branch = self.require_branch(branch_id)?;
        let vault = self.require_vault(vault_id)?;
        if branch.vault != *vault_id {
            return Err(LedgerError::InvalidAccountLink(format!(
                "branch {branch_id} belongs to vault {}, not {vault_id}",
                branch.vault
            )));
        }

        let holder = self.tokens.holder_of(&branch.capability);
        if !holder.is_some_and(|account| signer.is(&account.owner)) {
            return Err(LedgerError::unauthorized(
                signer.address(),
                "pay from this branch without holding its capability",
            ));
        }

        let recipient = self
            .tokens
            .account(recipient_account)
            .ok_or_else(|| LedgerError::not_found("recipient account", *recipient_account))?;
        if recipient.asset != state.claim_asset {
            return Err(LedgerError::InvalidAccountLink(format!(
                "recipient {recipient_account} holds {}, not the claim asset",
                recipient.asset
            )));
        }

        let supply = self
            .tokens
            .mint_info(&state.claim_asset)
            .ok_or_else(|| LedgerError::not_found("claim asset", state.claim_asset))?
            .supply;
        supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("claim asset supply"))?;
        let recipient_balance = recipient
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("recipient balance"))?;
        let vault_balance = vault
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("vault.balance"))?;
        let branch_balance = branch
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("branch.balance"))?;

        self.tokens
            .mint(&state.claim_asset, recipient_account, amount, &state_id)?;
        self.vault_mut(vault_id)?.balance = vault_balance;
        self.branch_mut(branch_id)?.balance = branch_balance;

        info!(
            amount,
            vault = %vault_id,
            branch = %branch_id,
            recipient = %recipient_account,
            vault_balance,
            branch_balance,
            "payment issued"
        );
        Ok(PaymentReceipt {
            amount,
            vault_balance,
            branch_balance,
            recipient_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::branch::OpenedBranch;
    use vaultline_protocol::crypto::keys::Keypair;
    use vaultline_protocol::token::{TokenClient, TokenLedger};

    struct Fixture {
        ledger: Ledger,
        issuer: Signer,
        admin: Signer,
        vault: Address,
        opened: OpenedBranch,
        recipient: Address,
    }

    fn fixture() -> Fixture {
        let mut tokens = TokenLedger::new();
        let issuer = Signer::from(&Keypair::generate());
        let reserve = TokenClient::new(&mut tokens, &issuer)
            .create_mint(&Signer::from(&Keypair::generate()), 6)
            .unwrap();
        let mut ledger: Ledger = Ledger::new(tokens);
        let platform = Signer::from(&Keypair::generate());
        let state = ledger.initialize(&platform, &reserve).unwrap();

        let admin = Signer::from(&Keypair::generate());
        let vault = Address::from(Keypair::generate().public_key());
        let positions = Address::from(Keypair::generate().public_key());
        ledger.open_vault(&admin, &vault, &positions).unwrap();
        let opened = ledger.open_branch(&admin, &vault).unwrap();

        let merchant = Address::from(Keypair::generate().public_key());
        let recipient = ledger
            .token_client(&admin)
            .create_associated(&merchant, &state.claim_asset)
            .unwrap();

        Fixture {
            ledger,
            issuer,
            admin,
            vault,
            opened,
            recipient,
        }
    }

    #[test]
    fn pay_credits_vault_branch_and_recipient() {
        let mut f = fixture();
        let receipt = f
            .ledger
            .pay(100, &f.admin, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap();
        assert_eq!(receipt.vault_balance, 100);
        assert_eq!(receipt.branch_balance, 100);
        assert_eq!(f.ledger.balance_of(&f.recipient), 100);

        f.ledger
            .pay(50, &f.admin, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap();
        assert_eq!(f.ledger.vault(&f.vault).unwrap().balance, 150);
        assert_eq!(f.ledger.branch(&f.opened.branch).unwrap().balance, 150);
        assert!(f.ledger.audit_vault(&f.vault).unwrap().is_consistent());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut f = fixture();
        let err = f
            .ledger
            .pay(0, &f.admin, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount);
    }

    #[test]
    fn non_holder_cannot_pay() {
        let mut f = fixture();
        let stranger = Signer::from(&Keypair::generate());
        let err = f
            .ledger
            .pay(10, &stranger, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(f.ledger.vault(&f.vault).unwrap().balance, 0);
        assert_eq!(f.ledger.balance_of(&f.recipient), 0);
    }

    #[test]
    fn recipient_must_hold_claim_asset() {
        let mut f = fixture();
        // The admin's capability account holds the wrong asset.
        let err = f
            .ledger
            .pay(10, &f.admin, &f.vault, &f.opened.branch, &f.opened.holder_account)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccountLink);

        let err = f
            .ledger
            .pay(10, &f.admin, &f.vault, &f.opened.branch, &Address::new([4u8; 32]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn overflow_is_caught_before_any_write() {
        let mut f = fixture();
        f.ledger
            .pay(u64::MAX, &f.admin, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap();
        let err = f
            .ledger
            .pay(1, &f.admin, &f.vault, &f.opened.branch, &f.recipient)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArithmeticOverflow);
        assert_eq!(f.ledger.vault(&f.vault).unwrap().balance, u64::MAX);
        assert_eq!(f.ledger.balance_of(&f.recipient), u64::MAX);
    }

    #[test]
    fn vault_overflow_after_redemption_leaves_balances_untouched() {
        let mut f = fixture();
        let state = f.ledger.global_state().unwrap().clone();
        f.ledger
            .token_client(&f.issuer)
            .mint_to(&state.reserve_asset, &state.controller, 10)
            .unwrap();
        let settle = f
            .ledger
            .token_client(&f.admin)
            .create_own_associated(&state.claim_asset)
            .unwrap();
        let out = f
            .ledger
            .token_client(&f.admin)
            .create_own_associated(&state.reserve_asset)
            .unwrap();

        f.ledger
            .pay(u64::MAX, &f.admin, &f.vault, &f.opened.branch, &settle)
            .unwrap();
        // Redeeming shrinks supply and the holder's balance, so only the
        // vault and branch totals are still at the limit.
        f.ledger.swap(10, &f.admin, &settle, &out).unwrap();
        assert_eq!(f.ledger.tokens().total_supply(&state.claim_asset), u64::MAX - 10);

        let err = f
            .ledger
            .pay(5, &f.admin, &f.vault, &f.opened.branch, &settle)
            .unwrap_err();
        assert_eq!(err, LedgerError::ArithmeticOverflow("vault.balance"));
        assert_eq!(f.ledger.vault(&f.vault).unwrap().balance, u64::MAX);
        assert_eq!(f.ledger.branch(&f.opened.branch).unwrap().balance, u64::MAX);
        assert_eq!(f.ledger.balance_of(&settle), u64::MAX - 10);
        assert_eq!(f.ledger.tokens().total_supply(&state.claim_asset), u64::MAX - 10);
    }
}
