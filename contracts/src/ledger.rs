//! # The Ledger
//!
//! Owns the record arena and the asset ledger it settles against. All six
//! operations (and the supplements) are `&mut self` methods defined in
//! [`ops`](crate::ops); this module holds construction, queries, the audit
//! helper and persistence.
//!
//! ## Atomicity
//!
//! Each operation runs every check (records, signer, ledger balances,
//! overflow) before the first write. The asset-ledger calls that follow are
//! therefore already known to succeed, so no operation can stop halfway.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vaultline_protocol::crypto::hash::blake3_hash;
use vaultline_protocol::identity::{state_address, Address, Signer};
use vaultline_protocol::storage::{DbError, DbResult, LedgerDb, SnapshotMeta};
use vaultline_protocol::token::{AssetLedger, TokenClient, TokenLedger};

use crate::error::{LedgerError, LedgerResult};
use crate::state::{Branch, GlobalState, Positions, Record, Vault};

/// The accounting core.
#[derive(Debug, Clone)]
pub struct Ledger<L: AssetLedger = TokenLedger> {
    pub(crate) records: BTreeMap<Address, Record>,
    pub(crate) tokens: L,
    pub(crate) processed: u64,
    /// Last accepted instruction nonce per signer address.
    pub(crate) nonces: BTreeMap<Address, u64>,
}

/// Result of recomputing a vault's totals from its branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAudit {
    pub vault: Address,
    /// Balance stored on the vault record.
    pub recorded_balance: u64,
    /// Sum over the vault's open branches.
    pub branch_sum: u128,
    /// Count stored on the vault record.
    pub recorded_branches: u64,
    /// Number of open branches found.
    pub open_branches: u64,
}

impl VaultAudit {
    /// Whether the stored totals match the branches.
    pub fn is_consistent(&self) -> bool {
        self.recorded_balance as u128 == self.branch_sum
            && self.recorded_branches == self.open_branches
    }
}

impl Default for Ledger<TokenLedger> {
    fn default() -> Self {
        Self::new(TokenLedger::new())
    }
}

impl<L: AssetLedger> Ledger<L> {
    /// An empty core on top of `tokens`.
    pub fn new(tokens: L) -> Self {
        Self {
            records: BTreeMap::new(),
            tokens,
            processed: 0,
            nonces: BTreeMap::new(),
        }
    }

    // -- Queries --------------------------------------------------------------

    /// The asset ledger, read-only.
    pub fn tokens(&self) -> &L {
        &self.tokens
    }

    /// Act on the asset ledger as `signer`. The authority is always the
    /// signer's own address.
    pub fn token_client<'a>(&'a mut self, signer: &'a Signer) -> TokenClient<'a, L> {
        TokenClient::new(&mut self.tokens, signer)
    }

    pub fn record(&self, address: &Address) -> Option<&Record> {
        self.records.get(address)
    }

    /// All records, ordered by address.
    pub fn records(&self) -> impl Iterator<Item = (&Address, &Record)> {
        self.records.iter()
    }

    /// The GlobalState singleton, if initialized.
    pub fn global_state(&self) -> Option<&GlobalState> {
        let (address, _) = state_address().ok()?;
        self.records.get(&address)?.as_global_state()
    }

    pub fn vault(&self, address: &Address) -> Option<&Vault> {
        self.records.get(address)?.as_vault()
    }

    pub fn branch(&self, address: &Address) -> Option<&Branch> {
        self.records.get(address)?.as_branch()
    }

    pub fn positions(&self, address: &Address) -> Option<&Positions> {
        self.records.get(address)?.as_positions()
    }

    /// Open branches whose parent is `vault`.
    pub fn branches_of<'a>(
        &'a self,
        vault: &'a Address,
    ) -> impl Iterator<Item = (&'a Address, &'a Branch)> + 'a {
        self.records.iter().filter_map(move |(address, record)| {
            record
                .as_branch()
                .filter(|b| b.vault == *vault)
                .map(|b| (address, b))
        })
    }

    /// Balance of a token account, zero if absent.
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.tokens.balance(account)
    }

    /// Number of signed instructions processed.
    pub fn processed_instructions(&self) -> u64 {
        self.processed
    }

    /// Last nonce accepted from `signer`, if any.
    pub fn last_nonce(&self, signer: &Address) -> Option<u64> {
        self.nonces.get(signer).copied()
    }

    /// Smallest nonce `signer` can use next.
    pub fn next_nonce(&self, signer: &Address) -> u64 {
        self.last_nonce(signer).map_or(1, |last| last.saturating_add(1))
    }

    /// Recompute `vault`'s balance and branch count from its branches.
    pub fn audit_vault(&self, vault: &Address) -> LedgerResult<VaultAudit> {
        let record = self.require_vault(vault)?;
        let (branch_sum, open_branches) = self
            .branches_of(vault)
            .fold((0u128, 0u64), |(sum, count), (_, b)| {
                (sum + b.balance as u128, count + 1)
            });
        Ok(VaultAudit {
            vault: *vault,
            recorded_balance: record.balance,
            branch_sum,
            recorded_branches: record.active_branches,
            open_branches,
        })
    }

    // -- Internal lookups ---------------------------------------------------

    /// GlobalState and its address, or `NotFound` before `initialize`.
    pub(crate) fn require_global_state(&self) -> LedgerResult<(Address, GlobalState)> {
        let (address, _) = state_address()?;
        let state = self
            .records
            .get(&address)
            .and_then(Record::as_global_state)
            .ok_or_else(|| LedgerError::not_found("global state", address))?;
        Ok((address, state.clone()))
    }

    pub(crate) fn require_vault(&self, address: &Address) -> LedgerResult<&Vault> {
        self.vault(address)
            .ok_or_else(|| LedgerError::not_found("vault", *address))
    }

    pub(crate) fn require_branch(&self, address: &Address) -> LedgerResult<&Branch> {
        self.branch(address)
            .ok_or_else(|| LedgerError::not_found("branch", *address))
    }

    /// Whether `address` holds a record, a mint or a token account.
    pub(crate) fn is_taken(&self, address: &Address) -> bool {
        self.records.contains_key(address) || self.tokens.is_occupied(address)
    }

    pub(crate) fn vault_mut(&mut self, address: &Address) -> LedgerResult<&mut Vault> {
        match self.records.get_mut(address) {
            Some(Record::Vault(v)) => Ok(v),
            _ => Err(LedgerError::not_found("vault", *address)),
        }
    }

    pub(crate) fn branch_mut(&mut self, address: &Address) -> LedgerResult<&mut Branch> {
        match self.records.get_mut(address) {
            Some(Record::Branch(b)) => Ok(b),
            _ => Err(LedgerError::not_found("branch", *address)),
        }
    }

    pub(crate) fn positions_mut(&mut self, address: &Address) -> LedgerResult<&mut Positions> {
        match self.records.get_mut(address) {
            Some(Record::Positions(p)) => Ok(p),
            _ => Err(LedgerError::not_found("positions", *address)),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

impl Ledger<TokenLedger> {
    /// BLAKE3 over the encoded records, mints, token accounts and nonces.
    pub fn fingerprint(&self) -> DbResult<[u8; 32]> {
        let mints: Vec<_> = self.tokens.mints().collect();
        let accounts: Vec<_> = self.tokens.accounts().collect();
        let bytes = bincode::serialize(&(&self.records, mints, accounts, &self.nonces))
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok(blake3_hash(&bytes))
    }

    /// Write the full state to `db` as one atomic snapshot.
    pub fn save(&self, db: &LedgerDb) -> DbResult<()> {
        let fingerprint = self.fingerprint()?;
        let meta = SnapshotMeta {
            processed_instructions: self.processed,
            fingerprint,
        };
        db.write_snapshot(
            &self.records,
            self.tokens.mints(),
            self.tokens.accounts(),
            &self.nonces,
            &meta,
        )?;
        info!(
            records = self.records.len(),
            processed = self.processed,
            fingerprint = %hex::encode(fingerprint),
            "ledger saved"
        );
        Ok(())
    }

    /// Rebuild a ledger from the last snapshot in `db`.
    ///
    /// # Errors
    ///
    /// [`DbError::FingerprintMismatch`] if the stored trees do not hash to
    /// the stored fingerprint, and [`DbError::MissingFingerprint`] if data
    /// exists without one. Either means the trees were written outside
    /// [`Ledger::save`].
    pub fn load(db: &LedgerDb) -> DbResult<Self> {
        let records: BTreeMap<Address, Record> = db.records::<Record>()?.into_iter().collect();
        let tokens = TokenLedger::from_parts(db.mints()?, db.token_accounts()?);
        let ledger = Self {
            records,
            tokens,
            processed: db.processed_instructions()?,
            nonces: db.nonces()?.into_iter().collect(),
        };

        let computed = ledger.fingerprint()?;
        match db.fingerprint()? {
            Some(stored) if stored == computed => {}
            Some(stored) => {
                return Err(DbError::FingerprintMismatch {
                    stored: hex::encode(stored),
                    computed: hex::encode(computed),
                })
            }
            None if db.is_empty() => {}
            None => return Err(DbError::MissingFingerprint),
        }
        debug!(records = ledger.records.len(), "ledger loaded");
        Ok(ledger)
    }
}
