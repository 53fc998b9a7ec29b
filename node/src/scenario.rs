//! # Reference Scenario
//!
//! Builds a ledger from nothing and walks it through the full lifecycle
//! with signed instructions:
//!
//! 1. A reserve issuer creates the reserve asset.
//! 2. The platform admin initializes; the issuer funds the controller.
//! 3. A tenant opens a vault and its default branch, and indexes it.
//! 4. The tenant pays into its own claim account, then redeems part of it.
//! 5. The tenant tries to close the funded branch, which is refused.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use vaultline_contracts::{Instruction, Ledger, Outcome, Receipt, SignedInstruction};
use vaultline_protocol::crypto::keys::Keypair;
use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::token::{TokenClient, TokenLedger};

use crate::cli::DemoArgs;

/// One processed instruction, for display.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub sequence: u64,
    pub instruction: &'static str,
    pub id: String,
}

/// Everything the scenario produced.
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub claim_asset: String,
    pub reserve_asset: String,
    pub controller: String,
    pub vault: String,
    pub branch: String,
    pub capability: String,
    pub vault_balance: u64,
    pub branch_balance: u64,
    pub active_branches: u64,
    pub controller_balance: u64,
    pub settle_balance: u64,
    pub recipient_balance: u64,
    pub claim_supply: u64,
    /// Error kind returned when closing the funded branch.
    pub close_branch: String,
    pub steps: Vec<StepReport>,
    pub fingerprint: String,
}

/// Run the scenario and return the final ledger with its report.
pub fn run(args: &DemoArgs) -> Result<(Ledger, DemoReport)> {
    if args.swap > args.pay {
        bail!("swap amount {} exceeds paid amount {}", args.swap, args.pay);
    }

    let issuer = Keypair::generate();
    let admin = Keypair::generate();
    let tenant = Keypair::generate();
    let issuer_signer = Signer::from(&issuer);
    let tenant_signer = Signer::from(&tenant);

    let mut tokens = TokenLedger::new();
    let reserve_asset = TokenClient::new(&mut tokens, &issuer_signer)
        .create_mint(&Signer::from(&Keypair::generate()), 6)
        .context("creating reserve asset")?;
    let mut ledger: Ledger = Ledger::new(tokens);
    let mut steps = Vec::new();

    let receipt = submit(&mut ledger, Instruction::Initialize { reserve_asset }, &admin, &mut steps)?;
    let state = match receipt.outcome {
        Outcome::Initialized(state) => state,
        other => bail!("initialize returned {other:?}"),
    };
    ledger
        .token_client(&issuer_signer)
        .mint_to(&reserve_asset, &state.controller, args.reserve)
        .context("funding reserve controller")?;

    let vault = Address::from(Keypair::generate().public_key());
    let positions = Address::from(Keypair::generate().public_key());
    submit(&mut ledger, Instruction::OpenVault { vault, positions }, &tenant, &mut steps)?;
    let receipt = submit(
        &mut ledger,
        Instruction::OpenBranch { vault, salt: None },
        &tenant,
        &mut steps,
    )?;
    let (branch, capability) = match receipt.outcome {
        Outcome::BranchOpened {
            branch, capability, ..
        } => (branch, capability),
        other => bail!("open_branch returned {other:?}"),
    };
    submit(&mut ledger, Instruction::IndexBranch { vault, branch }, &tenant, &mut steps)?;

    let settle = ledger
        .token_client(&tenant_signer)
        .create_own_associated(&state.claim_asset)
        .context("creating claim account")?;
    let recipient = ledger
        .token_client(&tenant_signer)
        .create_own_associated(&reserve_asset)
        .context("creating reserve account")?;

    submit(
        &mut ledger,
        Instruction::Pay {
            amount: args.pay,
            vault,
            branch,
            recipient: settle,
        },
        &tenant,
        &mut steps,
    )?;
    submit(
        &mut ledger,
        Instruction::Swap {
            amount: args.swap,
            settle,
            recipient,
        },
        &tenant,
        &mut steps,
    )?;

    let close = SignedInstruction::sign(
        Instruction::CloseBranch { vault, branch },
        ledger.next_nonce(&tenant_signer.address()),
        &tenant,
    )
    .context("signing close_branch")?;
    let close_branch = match ledger.process(&close) {
        Ok(_) => "closed".to_string(),
        Err(err) => err.kind().to_string(),
    };

    let vault_record = ledger.vault(&vault).context("vault missing after scenario")?;
    let branch_record = ledger.branch(&branch).context("branch missing after scenario")?;
    let report = DemoReport {
        claim_asset: state.claim_asset.to_string(),
        reserve_asset: reserve_asset.to_string(),
        controller: state.controller.to_string(),
        vault: vault.to_string(),
        branch: branch.to_string(),
        capability: capability.to_string(),
        vault_balance: vault_record.balance,
        branch_balance: branch_record.balance,
        active_branches: vault_record.active_branches,
        controller_balance: ledger.balance_of(&state.controller),
        settle_balance: ledger.balance_of(&settle),
        recipient_balance: ledger.balance_of(&recipient),
        claim_supply: ledger.tokens().total_supply(&state.claim_asset),
        close_branch,
        steps,
        fingerprint: hex::encode(ledger.fingerprint().context("fingerprinting ledger")?),
    };
    info!(
        vault_balance = report.vault_balance,
        controller_balance = report.controller_balance,
        "scenario complete"
    );
    Ok((ledger, report))
}

/// Sign, process and record one instruction.
fn submit(
    ledger: &mut Ledger,
    instruction: Instruction,
    keypair: &Keypair,
    steps: &mut Vec<StepReport>,
) -> Result<Receipt> {
    let name = instruction.name();
    let nonce = ledger.next_nonce(&Address::from(keypair.public_key()));
    let signed = SignedInstruction::sign(instruction, nonce, keypair)
        .with_context(|| format!("signing {name}"))?;
    let receipt = ledger
        .process(&signed)
        .with_context(|| format!("processing {name}"))?;
    steps.push(StepReport {
        sequence: receipt.sequence,
        instruction: name,
        id: receipt.instruction_id.clone(),
    });
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(reserve: u64, pay: u64, swap: u64) -> DemoArgs {
        DemoArgs {
            data_dir: None,
            reserve,
            pay,
            swap,
        }
    }

    #[test]
    fn default_scenario_matches_expected_balances() {
        let (ledger, report) = run(&args(1_000, 100, 60)).unwrap();
        assert_eq!(report.vault_balance, 100);
        assert_eq!(report.branch_balance, 100);
        assert_eq!(report.active_branches, 1);
        assert_eq!(report.controller_balance, 940);
        assert_eq!(report.settle_balance, 40);
        assert_eq!(report.recipient_balance, 60);
        assert_eq!(report.claim_supply, 40);
        assert_eq!(report.close_branch, "Conflict");
        assert_eq!(report.steps.len(), 6);
        assert_eq!(ledger.processed_instructions(), 6);
    }

    #[test]
    fn short_reserve_fails_the_swap_step() {
        let err = run(&args(10, 100, 60)).unwrap_err();
        assert!(format!("{err:#}").contains("insufficient reserve"));
    }

    #[test]
    fn swap_larger_than_payment_is_refused_up_front() {
        assert!(run(&args(1_000, 10, 60)).is_err());
    }
}
