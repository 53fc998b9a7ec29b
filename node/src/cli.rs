//! # CLI Interface
//!
//! Command-line structure for `vaultline-node`, via `clap` derive.
//! Subcommands: `demo`, `inspect`, `derive`, `keygen` and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::DEFAULT_FILTER;

/// Vaultline operator tool.
///
/// Runs the reference scenario against an in-memory or sled-backed ledger,
/// inspects a saved ledger, and computes derived addresses.
#[derive(Parser, Debug)]
#[command(
    name = "vaultline-node",
    about = "Vaultline operator tool",
    version,
    propagate_version = true
)]
pub struct VaultlineCli {
    /// Log format: `pretty` or `json`.
    #[arg(long, global = true, env = "VAULTLINE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "VAULTLINE_LOG_FILTER", default_value = DEFAULT_FILTER)]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the end-to-end scenario: initialize, open a vault and branch,
    /// pay, swap, attempt to close.
    Demo(DemoArgs),
    /// Load a saved ledger and print a summary.
    Inspect(InspectArgs),
    /// Print a derived address.
    Derive(DeriveArgs),
    /// Generate a keypair.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for `demo`.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Save the resulting ledger here. In-memory only when omitted.
    #[arg(long, short = 'd', env = "VAULTLINE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Reserve units minted into the controller.
    #[arg(long, default_value_t = 1_000)]
    pub reserve: u64,

    /// Amount paid into the branch.
    #[arg(long, default_value_t = 100)]
    pub pay: u64,

    /// Amount redeemed by the claim holder.
    #[arg(long, default_value_t = 60)]
    pub swap: u64,
}

/// Arguments for `inspect`.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Data directory written by `demo`.
    #[arg(long, short = 'd', env = "VAULTLINE_DATA_DIR")]
    pub data_dir: PathBuf,
}

/// Arguments for `derive`.
#[derive(Parser, Debug)]
pub struct DeriveArgs {
    #[command(subcommand)]
    pub target: DeriveTarget,
}

/// Addresses that can be derived. Inputs are base58 addresses.
#[derive(Subcommand, Debug)]
pub enum DeriveTarget {
    /// The GlobalState singleton.
    State,
    /// The claim-asset mint.
    ClaimAsset,
    /// The reserve controller for a reserve asset.
    Controller {
        reserve_asset: String,
    },
    /// A branch of a vault.
    Branch {
        vault: String,
        #[arg(long)]
        salt: Option<u64>,
    },
    /// The capability mint of a branch.
    Capability {
        branch: String,
    },
    /// The associated token account of an owner for an asset.
    Associated {
        owner: String,
        asset: String,
    },
}

/// Arguments for `keygen`.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Hex-encoded 32-byte secret to import instead of generating one.
    #[arg(long)]
    pub secret: Option<String>,
}
