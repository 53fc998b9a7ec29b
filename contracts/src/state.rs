//! # Ledger Records
//!
//! The four record kinds the core owns. Records reference each other by
//! [`Address`] only; the [`Ledger`](crate::Ledger) stores them in one arena
//! keyed by address.

use serde::{Deserialize, Serialize};

use vaultline_protocol::config::MAX_POSITIONS;
use vaultline_protocol::identity::Address;

/// Platform singleton. Written once by `initialize`, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Platform admin who initialized the ledger.
    pub admin: Address,
    /// The claim-asset mint.
    pub claim_asset: Address,
    /// The backing asset the controller holds.
    pub reserve_asset: Address,
    /// Custody account holding the reserve.
    pub controller: Address,
    /// Bump that puts this record's derived address off the curve.
    pub bump: u8,
}

/// A tenant account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Only this principal may open, index or close branches.
    pub admin: Address,
    /// Sum of the balances of the vault's open branches.
    pub balance: u64,
    /// Number of open branches.
    pub active_branches: u64,
    /// The vault's [`Positions`] index.
    pub positions: Address,
}

/// Bounded, append-only index of a vault's branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positions {
    pub vault: Address,
    pub branches: Vec<Address>,
}

impl Positions {
    pub fn new(vault: Address) -> Self {
        Self {
            vault,
            branches: Vec::with_capacity(MAX_POSITIONS),
        }
    }

    pub fn is_full(&self) -> bool {
        self.branches.len() >= MAX_POSITIONS
    }

    pub fn contains(&self, branch: &Address) -> bool {
        self.branches.contains(branch)
    }
}

/// A sub-account of a vault, gated by a one-unit capability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Parent vault.
    pub vault: Address,
    /// Capability mint. Whoever holds its single unit may pay into this branch.
    pub capability: Address,
    /// Total paid into this branch.
    pub balance: u64,
    /// Salt used in derivation, `None` for the default branch.
    pub salt: Option<u64>,
    /// Bump that puts the branch address off the curve.
    pub bump: u8,
}

/// One arena entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    GlobalState(GlobalState),
    Vault(Vault),
    Positions(Positions),
    Branch(Branch),
}

impl Record {
    /// Short name of the record kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::GlobalState(_) => "global_state",
            Record::Vault(_) => "vault",
            Record::Positions(_) => "positions",
            Record::Branch(_) => "branch",
        }
    }

    pub fn as_vault(&self) -> Option<&Vault> {
        match self {
            Record::Vault(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Record::Branch(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_positions(&self) -> Option<&Positions> {
        match self {
            Record::Positions(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_global_state(&self) -> Option<&GlobalState> {
        match self {
            Record::GlobalState(g) => Some(g),
            _ => None,
        }
    }
}
