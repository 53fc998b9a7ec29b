//! Integration tests for signer checks and capability-based payment rights.
//!
//! Every rejected call must leave the whole ledger byte-for-byte unchanged,
//! so most tests compare state fingerprints before and after.

use vaultline_contracts::{ErrorKind, GlobalState, Ledger, OpenedBranch};
use vaultline_protocol::crypto::keys::Keypair;
use vaultline_protocol::identity::{state_address, Address, Signer};
use vaultline_protocol::token::{AssetLedger, TokenClient, TokenError, TokenLedger};

struct World {
    ledger: Ledger,
    state: GlobalState,
    tenant: Signer,
    vault: Address,
    branch: OpenedBranch,
    settle: Address,
    out: Address,
}

/// Helper: initialized ledger, one vault with one branch, 500 claim units in
/// the tenant's settle account and 1000 reserve units in the controller.
fn world() -> World {
    let mut tokens = TokenLedger::new();
    let issuer = Signer::from(&Keypair::generate());
    let reserve_asset = TokenClient::new(&mut tokens, &issuer)
        .create_mint(&Signer::from(&Keypair::generate()), 6)
        .unwrap();
    let mut ledger: Ledger = Ledger::new(tokens);
    let state = ledger
        .initialize(&Signer::from(&Keypair::generate()), &reserve_asset)
        .unwrap();
    ledger
        .token_client(&issuer)
        .mint_to(&reserve_asset, &state.controller, 1_000)
        .unwrap();

    let tenant = Signer::from(&Keypair::generate());
    let vault = Address::from(Keypair::generate().public_key());
    ledger
        .open_vault(&tenant, &vault, &Address::from(Keypair::generate().public_key()))
        .unwrap();
    let branch = ledger.open_branch(&tenant, &vault).unwrap();
    let settle = ledger
        .token_client(&tenant)
        .create_own_associated(&state.claim_asset)
        .unwrap();
    let out = ledger
        .token_client(&tenant)
        .create_own_associated(&state.reserve_asset)
        .unwrap();
    ledger
        .pay(500, &tenant, &vault, &branch.branch, &settle)
        .unwrap();

    World {
        ledger,
        state,
        tenant,
        vault,
        branch,
        settle,
        out,
    }
}

// ---------------------------------------------------------------------------
// Unauthorized signers
// ---------------------------------------------------------------------------

#[test]
fn stranger_cannot_open_branch() {
    let mut w = world();
    let stranger = Signer::from(&Keypair::generate());
    let before = w.ledger.fingerprint().unwrap();

    let err = w
        .ledger
        .open_branch_with_salt(&stranger, &w.vault, 1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(w.ledger.fingerprint().unwrap(), before);
}

#[test]
fn stranger_cannot_pay() {
    let mut w = world();
    let stranger = Signer::from(&Keypair::generate());
    let before = w.ledger.fingerprint().unwrap();

    let err = w
        .ledger
        .pay(10, &stranger, &w.vault, &w.branch.branch, &w.settle)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(w.ledger.fingerprint().unwrap(), before);
}

#[test]
fn stranger_cannot_swap_someone_elses_claim() {
    let mut w = world();
    let stranger = Signer::from(&Keypair::generate());
    let stranger_out = w
        .ledger
        .token_client(&stranger)
        .create_own_associated(&w.state.reserve_asset)
        .unwrap();
    let before = w.ledger.fingerprint().unwrap();

    let err = w
        .ledger
        .swap(10, &stranger, &w.settle, &stranger_out)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(w.ledger.fingerprint().unwrap(), before);
}

#[test]
fn stranger_cannot_close_branch() {
    let mut w = world();
    let stranger = Signer::from(&Keypair::generate());
    let err = w
        .ledger
        .close_branch(&stranger, &w.vault, &w.branch.branch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

// ---------------------------------------------------------------------------
// Capability transfer
// ---------------------------------------------------------------------------

#[test]
fn capability_transfer_moves_payment_rights() {
    let mut w = world();
    let delegate = Signer::from(&Keypair::generate());

    let delegate_cap = w
        .ledger
        .token_client(&delegate)
        .create_own_associated(&w.branch.capability)
        .unwrap();
    w.ledger
        .token_client(&w.tenant)
        .transfer(&w.branch.capability, &w.branch.holder_account, &delegate_cap, 1)
        .unwrap();

    // The vault admin no longer holds the capability.
    let err = w
        .ledger
        .pay(10, &w.tenant, &w.vault, &w.branch.branch, &w.settle)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    // The delegate does.
    w.ledger
        .pay(10, &delegate, &w.vault, &w.branch.branch, &w.settle)
        .unwrap();
    assert_eq!(w.ledger.vault(&w.vault).unwrap().balance, 510);

    // Branch administration stays with the vault admin.
    let err = w
        .ledger
        .open_branch_with_salt(&delegate, &w.vault, 9)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

// ---------------------------------------------------------------------------
// Self-owned authority
// ---------------------------------------------------------------------------

#[test]
fn claim_asset_cannot_be_minted_from_outside() {
    let mut w = world();
    let err = w
        .ledger
        .token_client(&w.tenant)
        .mint_to(&w.state.claim_asset, &w.settle, 1_000_000)
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidMintAuthority(_)));
    assert_eq!(w.ledger.balance_of(&w.settle), 500);
}

#[test]
fn controller_cannot_be_drained_from_outside() {
    let mut w = world();
    let err = w
        .ledger
        .token_client(&w.tenant)
        .transfer(&w.state.reserve_asset, &w.state.controller, &w.out, 1_000)
        .unwrap_err();
    assert!(matches!(err, TokenError::InvalidOwner { .. }));
    assert_eq!(w.ledger.balance_of(&w.state.controller), 1_000);
}

#[test]
fn derived_authority_has_no_keypair() {
    let (state, _) = state_address().unwrap();
    assert!(!state.is_on_curve());
    let w = world();
    assert_eq!(
        w.ledger.tokens().mint_info(&w.state.claim_asset).unwrap().authority,
        state
    );
}

#[test]
fn wrong_vault_for_branch_is_invalid_link() {
    let mut w = world();
    let other_vault = Address::from(Keypair::generate().public_key());
    w.ledger
        .open_vault(&w.tenant, &other_vault, &Address::from(Keypair::generate().public_key()))
        .unwrap();
    let before = w.ledger.fingerprint().unwrap();
    let err = w
        .ledger
        .pay(10, &w.tenant, &other_vault, &w.branch.branch, &w.settle)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAccountLink);
    assert_eq!(w.ledger.fingerprint().unwrap(), before);
}
