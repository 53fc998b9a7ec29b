//! # Operations
//!
//! Every state transition of the core, one file per concern:
//!
//! | File          | Operations                                     |
//! |---------------|------------------------------------------------|
//! | `initialize`  | `initialize`                                   |
//! | `vault`       | `open_vault`, `index_branch`                   |
//! | `branch`      | `open_branch`, `open_branch_with_salt`, `close_branch` |
//! | `payment`     | `pay`                                          |
//! | `swap`        | `swap`                                         |
//!
//! Each operation takes the acting [`Signer`](vaultline_protocol::identity::Signer)
//! explicitly, checks everything, then writes. Rejections log at `warn` and
//! return the error unchanged.

pub mod branch;
pub mod initialize;
pub mod payment;
pub mod swap;
pub mod vault;

use tracing::warn;

use crate::error::LedgerResult;

/// Log a rejected operation and hand the result back.
pub(crate) fn logged<T>(operation: &'static str, result: LedgerResult<T>) -> LedgerResult<T> {
    if let Err(err) = &result {
        warn!(operation, kind = %err.kind(), error = %err, "operation rejected");
    }
    result
}
