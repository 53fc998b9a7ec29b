//! # Branch Lifecycle
//!
//! A branch is `absent -> open -> absent`. Opening one mints its ownership
//! capability: a zero-decimal asset at `derive(["mint", branch])` with a
//! supply of exactly one unit, delivered to the vault admin's associated
//! account. The capability's mint authority is its own derived address, so
//! no second unit can ever be issued.
//!
//! Closing removes the branch record and decrements the vault counter in the
//! same step. A branch with a nonzero balance cannot be closed, which keeps
//! the vault total equal to the sum over its open branches. The capability
//! mint survives the branch, so an unsalted branch slot is single-use.

use tracing::info;

use vaultline_protocol::config::{CAPABILITY_DECIMALS, CAPABILITY_SUPPLY};
use vaultline_protocol::identity::{
    associated_account_address, branch_address, capability_address, Address, Signer,
};
use vaultline_protocol::token::AssetLedger;

use super::logged;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::state::{Branch, Record};

/// Addresses produced by opening a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedBranch {
    pub branch: Address,
    /// The capability mint.
    pub capability: Address,
    /// The admin's account holding the single capability unit.
    pub holder_account: Address,
}

impl<L: AssetLedger> Ledger<L> {
    /// Open the default branch of `vault_id`.
    pub fn open_branch(&mut self, signer: &Signer, vault_id: &Address) -> LedgerResult<OpenedBranch> {
        let result = self.try_open_branch(signer, vault_id, None);
        logged("open_branch", result)
    }

    /// Open an additional branch of `vault_id`, distinguished by `salt`.
    pub fn open_branch_with_salt(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        salt: u64,
    ) -> LedgerResult<OpenedBranch> {
        let result = self.try_open_branch(signer, vault_id, Some(salt));
        logged("open_branch_with_salt", result)
    }

    fn try_open_branch(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        salt: Option<u64>,
    ) -> LedgerResult<OpenedBranch> {
        let vault = self.require_vault(vault_id)?;
        if !signer.is(&vault.admin) {
            return Err(LedgerError::unauthorized(signer.address(), "open branches of this vault"));
        }
        let active_branches = vault
            .active_branches
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("vault.active_branches"))?;

        let (branch_id, bump) = branch_address(vault_id, salt)?;
        let (capability, _) = capability_address(&branch_id)?;
        let admin = signer.address();
        let holder_account = associated_account_address(&admin, &capability)?;

        if self.records.contains_key(&branch_id) {
            return Err(LedgerError::conflict(branch_id, "branch already open"));
        }
        if self.is_taken(&branch_id) {
            return Err(LedgerError::conflict(branch_id, "address already in use"));
        }
        if self.is_taken(&capability) {
            return Err(LedgerError::conflict(capability, "capability already minted"));
        }
        if self.is_taken(&holder_account) {
            return Err(LedgerError::conflict(holder_account, "address already in use"));
        }

        self.tokens
            .create_mint(capability, CAPABILITY_DECIMALS, capability)?;
        self.tokens
            .create_account(holder_account, admin, capability)?;
        self.tokens
            .mint(&capability, &holder_account, CAPABILITY_SUPPLY, &capability)?;

        self.records.insert(
            branch_id,
            Record::Branch(Branch {
                vault: *vault_id,
                capability,
                balance: 0,
                salt,
                bump,
            }),
        );
        self.vault_mut(vault_id)?.active_branches = active_branches;

        info!(
            vault = %vault_id,
            branch = %branch_id,
            %capability,
            ?salt,
            active_branches,
            "branch opened"
        );
        Ok(OpenedBranch {
            branch: branch_id,
            capability,
            holder_account,
        })
    }

    /// Close `branch_id` under `vault_id`. The branch must have a zero balance.
    pub fn close_branch(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
    ) -> LedgerResult<()> {
        let result = self.try_close_branch(signer, vault_id, branch_id);
        logged("close_branch", result)
    }

    fn try_close_branch(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
    ) -> LedgerResult<()> {
        let vault = self.require_vault(vault_id)?;
        if !signer.is(&vault.admin) {
            return Err(LedgerError::unauthorized(signer.address(), "close branches of this vault"));
        }
        let vault_branches = vault.active_branches;

        let branch = self.require_branch(branch_id)?;
        if branch.vault != *vault_id {
            return Err(LedgerError::InvalidAccountLink(format!(
                "branch {branch_id} belongs to vault {}, not {vault_id}",
                branch.vault
            )));
        }
        if branch.balance != 0 {
            return Err(LedgerError::conflict(
                *branch_id,
                "branch balance must be zero to close",
            ));
        }
        let active_branches = vault_branches
            .checked_sub(1)
            .ok_or(LedgerError::ArithmeticOverflow("vault.active_branches"))?;

        self.records.remove(branch_id);
        self.vault_mut(vault_id)?.active_branches = active_branches;

        info!(vault = %vault_id, branch = %branch_id, active_branches, "branch closed");
        Ok(())
    }
}
