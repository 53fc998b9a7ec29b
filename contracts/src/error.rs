//! # Ledger Errors
//!
//! Every rejected operation returns one of these and leaves all records as
//! they were. Callers that only care about the category match on
//! [`LedgerError::kind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vaultline_protocol::identity::{Address, DerivationError};
use vaultline_protocol::token::TokenError;

/// Errors returned by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// GlobalState already exists.
    #[error("ledger already initialized")]
    AlreadyInitialized,

    /// The signer is not the principal this operation requires.
    #[error("unauthorized: {signer} may not {action}")]
    Unauthorized {
        /// Address of the presented signer.
        signer: Address,
        /// What was attempted.
        action: &'static str,
    },

    /// A referenced record, mint or account does not exist.
    #[error("{what} not found: {address}")]
    NotFound {
        /// Kind of thing that was looked up.
        what: &'static str,
        /// Where it was looked up.
        address: Address,
    },

    /// The address is already taken, or the operation would violate a
    /// uniqueness or state rule.
    #[error("conflict at {address}: {reason}")]
    Conflict {
        /// The contested address.
        address: Address,
        /// Why the operation cannot proceed.
        reason: &'static str,
    },

    /// The settle account holds less claim asset than requested.
    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance {
        /// Balance available.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// The reserve controller cannot cover the redemption.
    #[error("insufficient reserve: controller holds {available}, need {requested}")]
    InsufficientReserve {
        /// Reserve held by the controller.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// Two records (or a record and an account) that must be linked are not.
    #[error("invalid account link: {0}")]
    InvalidAccountLink(String),

    /// A counter or balance would overflow.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Zero amounts are rejected.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("asset ledger error: {0}")]
    Token(#[from] TokenError),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error category, for callers that do not need the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AlreadyInitialized,
    Unauthorized,
    NotFound,
    Conflict,
    InsufficientBalance,
    InsufficientReserve,
    InvalidAccountLink,
    ArithmeticOverflow,
    InvalidAmount,
    Derivation,
    Token,
}

impl LedgerError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            LedgerError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::InsufficientReserve { .. } => ErrorKind::InsufficientReserve,
            LedgerError::InvalidAccountLink(_) => ErrorKind::InvalidAccountLink,
            LedgerError::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            LedgerError::InvalidAmount => ErrorKind::InvalidAmount,
            LedgerError::Derivation(_) => ErrorKind::Derivation,
            LedgerError::Token(_) => ErrorKind::Token,
        }
    }

    pub(crate) fn unauthorized(signer: Address, action: &'static str) -> Self {
        LedgerError::Unauthorized { signer, action }
    }

    pub(crate) fn not_found(what: &'static str, address: Address) -> Self {
        LedgerError::NotFound { what, address }
    }

    pub(crate) fn conflict(address: Address, reason: &'static str) -> Self {
        LedgerError::Conflict { address, reason }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::AlreadyInitialized => "AlreadyInitialized",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InsufficientBalance => "InsufficientBalance",
            ErrorKind::InsufficientReserve => "InsufficientReserve",
            ErrorKind::InvalidAccountLink => "InvalidAccountLink",
            ErrorKind::ArithmeticOverflow => "ArithmeticOverflow",
            ErrorKind::InvalidAmount => "InvalidAmount",
            ErrorKind::Derivation => "Derivation",
            ErrorKind::Token => "Token",
        };
        f.write_str(name)
    }
}
