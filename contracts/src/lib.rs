//! # Vaultline Accounting Core
//!
//! Vaults, branches, claim-asset issuance and redemption against a reserve.
//!
//! - **Vaults** are tenant accounts. Each one has an admin, a running
//!   balance, a count of open branches and a bounded positions index.
//! - **Branches** are sub-accounts under a vault. Opening one mints a
//!   single-unit capability token; whoever holds it may pay from the branch.
//! - **Payments** issue claim-asset units to a recipient and credit the
//!   branch and its vault together.
//! - **Swaps** burn claim-asset units and release the same amount of reserve
//!   asset from the controller.
//!
//! ## Design Principles
//!
//! 1. Every record lives at an address; records point at each other by
//!    address, never by reference.
//! 2. Every mutation names its signer. There is no ambient authority.
//! 3. Every operation checks everything before it writes anything, and all
//!    arithmetic is checked.
//! 4. The core never moves tokens itself; it drives an [`AssetLedger`].
//!
//! [`AssetLedger`]: vaultline_protocol::token::AssetLedger

pub mod error;
pub mod ledger;
pub mod ops;
pub mod processor;
pub mod state;

pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use ledger::{Ledger, VaultAudit};
pub use ops::branch::OpenedBranch;
pub use ops::payment::PaymentReceipt;
pub use ops::swap::SwapReceipt;
pub use processor::{Instruction, Outcome, Receipt, SignedInstruction};
pub use state::{Branch, GlobalState, Positions, Record, Vault};
