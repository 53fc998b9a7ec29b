//! Vault creation and the Positions index.

use tracing::info;

use vaultline_protocol::config::MAX_POSITIONS;
use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::token::AssetLedger;

use super::logged;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::state::{Positions, Record, Vault};

impl<L: AssetLedger> Ledger<L> {
    /// Create a vault at `vault_id` and its positions index at
    /// `positions_id`, both administered by `signer`.
    ///
    /// One signer may own any number of vaults.
    pub fn open_vault(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        positions_id: &Address,
    ) -> LedgerResult<()> {
        let result = self.try_open_vault(signer, vault_id, positions_id);
        logged("open_vault", result)
    }

    fn try_open_vault(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        positions_id: &Address,
    ) -> LedgerResult<()> {
        if vault_id == positions_id {
            return Err(LedgerError::conflict(
                *vault_id,
                "vault and positions must be distinct",
            ));
        }
        for address in [vault_id, positions_id] {
            if self.is_taken(address) {
                return Err(LedgerError::conflict(*address, "address already in use"));
            }
        }

        let admin = signer.address();
        self.records.insert(
            *positions_id,
            Record::Positions(Positions::new(*vault_id)),
        );
        self.records.insert(
            *vault_id,
            Record::Vault(Vault {
                admin,
                balance: 0,
                active_branches: 0,
                positions: *positions_id,
            }),
        );

        info!(vault = %vault_id, positions = %positions_id, %admin, "vault opened");
        Ok(())
    }

    /// Append `branch_id` to the vault's positions index.
    ///
    /// The index holds at most five entries and never shrinks.
    pub fn index_branch(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
    ) -> LedgerResult<()> {
        let result = self.try_index_branch(signer, vault_id, branch_id);
        logged("index_branch", result)
    }

    fn try_index_branch(
        &mut self,
        signer: &Signer,
        vault_id: &Address,
        branch_id: &Address,
    ) -> LedgerResult<()> {
        let vault = self.require_vault(vault_id)?;
        if !signer.is(&vault.admin) {
            return Err(LedgerError::unauthorized(signer.address(), "index branches of this vault"));
        }
        let positions_id = vault.positions;

        let branch = self.require_branch(branch_id)?;
        if branch.vault != *vault_id {
            return Err(LedgerError::InvalidAccountLink(format!(
                "branch {branch_id} belongs to vault {}, not {vault_id}",
                branch.vault
            )));
        }

        let positions = self
            .positions(&positions_id)
            .ok_or_else(|| LedgerError::not_found("positions", positions_id))?;
        if positions.vault != *vault_id {
            return Err(LedgerError::InvalidAccountLink(format!(
                "positions {positions_id} does not index vault {vault_id}"
            )));
        }
        if positions.contains(branch_id) {
            return Err(LedgerError::conflict(*branch_id, "branch already indexed"));
        }
        if positions.is_full() {
            return Err(LedgerError::conflict(positions_id, "positions index is full"));
        }

        let positions = self.positions_mut(&positions_id)?;
        positions.branches.push(*branch_id);
        let count = positions.branches.len();

        info!(
            vault = %vault_id,
            branch = %branch_id,
            indexed = count,
            capacity = MAX_POSITIONS,
            "branch indexed"
        );
        Ok(())
    }
}
