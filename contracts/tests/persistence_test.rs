//! Integration tests for saving and restoring the ledger through sled.

use vaultline_contracts::{ErrorKind, Ledger, Record};
use vaultline_protocol::crypto::keys::Keypair;
use vaultline_protocol::identity::{Address, Signer};
use vaultline_protocol::storage::{DbError, LedgerDb};
use vaultline_protocol::token::{AssetLedger, TokenClient, TokenLedger};

fn fresh_id() -> Address {
    Address::from(Keypair::generate().public_key())
}

#[test]
fn round_trip_restores_every_record_and_balance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vaultline");

    let tenant = Signer::from(&Keypair::generate());
    let vault = fresh_id();
    let (branch, settle, fingerprint) = {
        let mut tokens = TokenLedger::new();
        let issuer = Signer::from(&Keypair::generate());
        let reserve = TokenClient::new(&mut tokens, &issuer)
            .create_mint(&Signer::from(&Keypair::generate()), 6)
            .unwrap();
        let mut ledger: Ledger = Ledger::new(tokens);
        let state = ledger
            .initialize(&Signer::from(&Keypair::generate()), &reserve)
            .unwrap();
        ledger.open_vault(&tenant, &vault, &fresh_id()).unwrap();
        let branch = ledger.open_branch(&tenant, &vault).unwrap().branch;
        let settle = ledger
            .token_client(&tenant)
            .create_own_associated(&state.claim_asset)
            .unwrap();
        ledger.pay(75, &tenant, &vault, &branch, &settle).unwrap();

        let db = LedgerDb::open(&path).unwrap();
        ledger.save(&db).unwrap();
        (branch, settle, ledger.fingerprint().unwrap())
    };

    let db = LedgerDb::open(&path).unwrap();
    let mut restored = Ledger::load(&db).unwrap();
    assert_eq!(restored.fingerprint().unwrap(), fingerprint);
    assert_eq!(db.fingerprint().unwrap(), Some(fingerprint));
    assert!(restored.global_state().is_some());
    assert_eq!(restored.vault(&vault).unwrap().balance, 75);
    assert_eq!(restored.branch(&branch).unwrap().balance, 75);
    assert_eq!(restored.balance_of(&settle), 75);

    // The capability holders index is rebuilt, so payment rights survive.
    restored
        .pay(25, &tenant, &vault, &branch, &settle)
        .unwrap();
    assert_eq!(restored.vault(&vault).unwrap().balance, 100);

    // And so does the one-time initialization guard.
    let reserve = restored.global_state().unwrap().reserve_asset;
    let err = restored.initialize(&tenant, &reserve).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
}

#[test]
fn closed_branch_disappears_from_disk() {
    let db = LedgerDb::open_temporary().unwrap();
    let mut ledger: Ledger = Ledger::default();
    let tenant = Signer::from(&Keypair::generate());
    let vault = fresh_id();
    ledger.open_vault(&tenant, &vault, &fresh_id()).unwrap();
    let opened = ledger.open_branch(&tenant, &vault).unwrap();
    ledger.save(&db).unwrap();
    assert_eq!(db.record_count(), 3);

    ledger.close_branch(&tenant, &vault, &opened.branch).unwrap();
    ledger.save(&db).unwrap();
    assert_eq!(db.record_count(), 2);

    let restored = Ledger::load(&db).unwrap();
    assert!(restored.branch(&opened.branch).is_none());
    assert_eq!(restored.vault(&vault).unwrap().active_branches, 0);
    // The capability mint is ledger state, not a record, and stays.
    assert!(restored.tokens().mint_info(&opened.capability).is_some());
}

#[test]
fn torn_snapshot_refuses_to_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = LedgerDb::open(dir.path()).unwrap();

    let mut tokens = TokenLedger::new();
    let reserve = TokenClient::new(&mut tokens, &Signer::from(&Keypair::generate()))
        .create_mint(&Signer::from(&Keypair::generate()), 6)
        .unwrap();
    let mut ledger: Ledger = Ledger::new(tokens);
    let state = ledger
        .initialize(&Signer::from(&Keypair::generate()), &reserve)
        .unwrap();
    let tenant = Signer::from(&Keypair::generate());
    let vault = fresh_id();
    ledger.open_vault(&tenant, &vault, &fresh_id()).unwrap();
    let branch = ledger.open_branch(&tenant, &vault).unwrap().branch;
    let settle = ledger
        .token_client(&tenant)
        .create_own_associated(&state.claim_asset)
        .unwrap();
    ledger.save(&db).unwrap();

    // The vault record of a later payment lands, but its claim issuance
    // and the snapshot metadata do not.
    ledger.pay(100, &tenant, &vault, &branch, &settle).unwrap();
    let paid = ledger.vault(&vault).unwrap().clone();
    db.put_record(&vault, &Record::Vault(paid)).unwrap();
    drop(db);

    let db = LedgerDb::open(dir.path()).unwrap();
    let err = Ledger::load(&db).unwrap_err();
    assert!(matches!(err, DbError::FingerprintMismatch { .. }), "{err}");
}
