// Copyright (c) 2026 Vaultline Contributors. MIT License.
// See LICENSE for details.

//! # Vaultline Node
//!
//! Entry point for the `vaultline-node` binary. Parses CLI arguments,
//! initializes logging and dispatches to a subcommand:
//!
//! - `demo`    — run the reference scenario, optionally saving the ledger
//! - `inspect` — load a saved ledger and print a summary
//! - `derive`  — compute a derived address
//! - `keygen`  — generate or import a keypair
//! - `version` — print build version information
//!
//! Reports go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;

use vaultline_contracts::Ledger;
use vaultline_protocol::crypto::keys::Keypair;
use vaultline_protocol::identity::{self, Address};
use vaultline_protocol::storage::LedgerDb;

use cli::{Commands, DeriveTarget, VaultlineCli};
use logging::LogFormat;

/// Subdirectory of the data directory that holds the sled tree.
const LEDGER_DIR: &str = "ledger";

fn main() -> Result<()> {
    let cli = VaultlineCli::parse();
    logging::init_logging(&cli.log_filter, LogFormat::from_str_lossy(&cli.log_format));

    match cli.command {
        Commands::Demo(args) => run_demo(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Derive(args) => derive(args.target),
        Commands::Keygen(args) => keygen(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs the scenario and prints its report. Saves the ledger when a data
/// directory is given; refuses to overwrite an existing ledger.
fn run_demo(args: cli::DemoArgs) -> Result<()> {
    tracing::info!(
        reserve = args.reserve,
        pay = args.pay,
        swap = args.swap,
        "running demo scenario"
    );

    let (ledger, report) = scenario::run(&args)?;

    if let Some(data_dir) = &args.data_dir {
        let db = open_db(data_dir)?;
        if !db.is_empty() {
            anyhow::bail!(
                "ledger at {} already holds records; pick an empty data directory",
                data_dir.display()
            );
        }
        ledger
            .save(&db)
            .with_context(|| format!("failed to save ledger to {}", data_dir.display()))?;
        tracing::info!(data_dir = %data_dir.display(), "ledger saved");
    }

    print_json(&report)
}

/// Per-vault line of the `inspect` summary.
#[derive(Debug, Serialize)]
struct VaultSummary {
    vault: String,
    admin: String,
    balance: u64,
    active_branches: u64,
    branches: Vec<String>,
    consistent: bool,
}

/// Output of `inspect`.
#[derive(Debug, Serialize)]
struct LedgerSummary {
    initialized: bool,
    claim_asset: Option<String>,
    reserve_asset: Option<String>,
    controller: Option<String>,
    controller_balance: Option<u64>,
    claim_supply: Option<u64>,
    records: usize,
    mints: usize,
    token_accounts: usize,
    processed_instructions: u64,
    vaults: Vec<VaultSummary>,
    fingerprint: String,
}

fn inspect(args: cli::InspectArgs) -> Result<()> {
    let db = open_db(&args.data_dir)?;
    let ledger = Ledger::load(&db)
        .with_context(|| format!("failed to load ledger from {}", args.data_dir.display()))?;
    let summary = summarize(&ledger)?;
    tracing::info!(
        records = summary.records,
        vaults = summary.vaults.len(),
        "ledger loaded"
    );
    print_json(&summary)
}

fn summarize(ledger: &Ledger) -> Result<LedgerSummary> {
    let state = ledger.global_state();
    let mut vaults = Vec::new();
    for (address, record) in ledger.records() {
        let Some(vault) = record.as_vault() else {
            continue;
        };
        let audit = ledger
            .audit_vault(address)
            .with_context(|| format!("auditing vault {address}"))?;
        if !audit.is_consistent() {
            tracing::warn!(vault = %address, ?audit, "vault totals disagree with its branches");
        }
        vaults.push(VaultSummary {
            vault: address.to_string(),
            admin: vault.admin.to_string(),
            balance: vault.balance,
            active_branches: vault.active_branches,
            branches: ledger
                .branches_of(address)
                .map(|(branch, _)| branch.to_string())
                .collect(),
            consistent: audit.is_consistent(),
        });
    }

    Ok(LedgerSummary {
        initialized: state.is_some(),
        claim_asset: state.map(|s| s.claim_asset.to_string()),
        reserve_asset: state.map(|s| s.reserve_asset.to_string()),
        controller: state.map(|s| s.controller.to_string()),
        controller_balance: state.map(|s| ledger.balance_of(&s.controller)),
        claim_supply: state.map(|s| ledger.tokens().total_supply(&s.claim_asset)),
        records: ledger.records().count(),
        mints: ledger.tokens().mints().count(),
        token_accounts: ledger.tokens().account_count(),
        processed_instructions: ledger.processed_instructions(),
        vaults,
        fingerprint: hex::encode(ledger.fingerprint().context("fingerprinting ledger")?),
    })
}

fn derive(target: DeriveTarget) -> Result<()> {
    let (address, bump) = derive_address(&target)?;
    print_json(&serde_json::json!({
        "address": address.to_string(),
        "bump": bump,
    }))
}

fn derive_address(target: &DeriveTarget) -> Result<(Address, u8)> {
    let derived = match target {
        DeriveTarget::State => identity::state_address()?,
        DeriveTarget::ClaimAsset => identity::claim_asset_address()?,
        DeriveTarget::Controller { reserve_asset } => {
            identity::controller_address(&parse_address("reserve asset", reserve_asset)?)?
        }
        DeriveTarget::Branch { vault, salt } => {
            identity::branch_address(&parse_address("vault", vault)?, *salt)?
        }
        DeriveTarget::Capability { branch } => {
            identity::capability_address(&parse_address("branch", branch)?)?
        }
        DeriveTarget::Associated { owner, asset } => identity::associated_account_address(
            &parse_address("owner", owner)?,
            &parse_address("asset", asset)?,
        )?,
    };
    Ok(derived)
}

fn parse_address(what: &str, input: &str) -> Result<Address> {
    input
        .parse::<Address>()
        .with_context(|| format!("invalid {what} address: {input}"))
}

fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = match &args.secret {
        Some(secret) => Keypair::from_hex(secret).context("failed to import secret key")?,
        None => Keypair::generate(),
    };
    let public_key = keypair.public_key();
    tracing::info!(address = %public_key.to_base58(), "keypair ready");

    print_json(&serde_json::json!({
        "address": Address::from(public_key).to_string(),
        "public_key": public_key.to_hex(),
        "secret_key": keypair.to_hex(),
    }))
}

fn open_db(data_dir: &Path) -> Result<LedgerDb> {
    let db_path = data_dir.join(LEDGER_DIR);
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{out}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("vaultline-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol       {}", vaultline_protocol::config::PROTOCOL_VERSION);
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
