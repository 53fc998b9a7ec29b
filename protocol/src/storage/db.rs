//! # LedgerDb — Persistent Storage
//!
//! sled-backed persistence for the accounting core and its asset ledger.
//!
//! ## Tree Layout
//!
//! | Tree             | Key                | Value                   |
//! |------------------|--------------------|-------------------------|
//! | `records`        | `address` (32B)    | `bincode(R)`            |
//! | `mints`          | `address` (32B)    | `bincode(Mint)`         |
//! | `token_accounts` | `address` (32B)    | `bincode(TokenAccount)` |
//! | `nonces`         | `address` (32B)    | `bincode(u64)`          |
//! | `metadata`       | key (UTF-8)        | value (bytes)           |
//!
//! The record type `R` belongs to the caller; this module only needs it to
//! be serde-serializable.
//!
//! ## Atomicity
//!
//! [`LedgerDb::write_snapshot`] builds one `Batch` per tree (inserts for
//! live entries, removals for entries that disappeared) and applies all of
//! them, metadata included, in a single multi-tree transaction. Readers see
//! the old snapshot or the new one, never a mix: a closed branch vanishes
//! from disk together with the vault update, and the stored fingerprint
//! always describes the trees written alongside it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Batch, Db, Transactional, Tree};
use tracing::debug;

use crate::identity::Address;
use crate::token::{Mint, TokenAccount};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt key in tree {tree}: expected 32 bytes, got {len}")]
    CorruptKey {
        /// Tree the key was read from.
        tree: &'static str,
        /// Length of the stored key.
        len: usize,
    },

    #[error("snapshot fingerprint mismatch: stored {stored}, computed {computed}")]
    FingerprintMismatch { stored: String, computed: String },

    #[error("snapshot holds data but no fingerprint")]
    MissingFingerprint,
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

/// Number of instructions processed when the snapshot was written.
const META_PROCESSED: &[u8] = b"processed_instructions";

/// Fingerprint of the snapshot contents.
const META_FINGERPRINT: &[u8] = b"state_fingerprint";

/// Metadata committed with every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub processed_instructions: u64,
    /// Fingerprint of the records, mints, accounts and nonces written.
    pub fingerprint: [u8; 32],
}

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for records, mints, token accounts and signer nonces.
///
/// Cloning is cheap: sled handles are reference counted, and all trees
/// support concurrent readers.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    records: Tree,
    mints: Tree,
    token_accounts: Tree,
    nonces: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway in-memory database, removed on drop.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let records = db.open_tree("records")?;
        let mints = db.open_tree("mints")?;
        let token_accounts = db.open_tree("token_accounts")?;
        let nonces = db.open_tree("nonces")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            records,
            mints,
            token_accounts,
            nonces,
            metadata,
        })
    }

    // -- Records ------------------------------------------------------------

    /// Store a single record.
    pub fn put_record<R: Serialize>(&self, address: &Address, record: &R) -> DbResult<()> {
        self.records.insert(address.as_bytes(), encode(record)?)?;
        Ok(())
    }

    /// Load a single record.
    pub fn get_record<R: DeserializeOwned>(&self, address: &Address) -> DbResult<Option<R>> {
        self.records
            .get(address.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All records, ordered by address.
    pub fn records<R: DeserializeOwned>(&self) -> DbResult<Vec<(Address, R)>> {
        read_tree(&self.records, "records")
    }

    // -- Asset ledger -------------------------------------------------------

    /// Load a mint.
    pub fn get_mint(&self, address: &Address) -> DbResult<Option<Mint>> {
        self.mints
            .get(address.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All mints, ordered by address.
    pub fn mints(&self) -> DbResult<Vec<Mint>> {
        Ok(read_tree::<Mint>(&self.mints, "mints")?
            .into_iter()
            .map(|(_, mint)| mint)
            .collect())
    }

    /// Load a token account.
    pub fn get_token_account(&self, address: &Address) -> DbResult<Option<TokenAccount>> {
        self.token_accounts
            .get(address.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All token accounts, ordered by address.
    pub fn token_accounts(&self) -> DbResult<Vec<TokenAccount>> {
        Ok(read_tree::<TokenAccount>(&self.token_accounts, "token_accounts")?
            .into_iter()
            .map(|(_, account)| account)
            .collect())
    }

    // -- Signer nonces ------------------------------------------------------

    /// Last accepted instruction nonce per signer, ordered by address.
    pub fn nonces(&self) -> DbResult<Vec<(Address, u64)>> {
        read_tree(&self.nonces, "nonces")
    }

    // -- Snapshots ----------------------------------------------------------

    /// Replace everything on disk with the given state, atomically.
    pub fn write_snapshot<'a, R, I, M, A, N>(
        &self,
        records: I,
        mints: M,
        accounts: A,
        nonces: N,
        meta: &SnapshotMeta,
    ) -> DbResult<()>
    where
        R: Serialize + 'a,
        I: IntoIterator<Item = (&'a Address, &'a R)>,
        M: IntoIterator<Item = &'a Mint>,
        A: IntoIterator<Item = &'a TokenAccount>,
        N: IntoIterator<Item = (&'a Address, &'a u64)>,
    {
        let (record_batch, record_count) = replacement_batch(&self.records, records)?;
        let (mint_batch, mint_count) =
            replacement_batch(&self.mints, mints.into_iter().map(|m| (&m.address, m)))?;
        let (account_batch, account_count) = replacement_batch(
            &self.token_accounts,
            accounts.into_iter().map(|a| (&a.address, a)),
        )?;
        let (nonce_batch, _) = replacement_batch(&self.nonces, nonces)?;
        let mut meta_batch = Batch::default();
        meta_batch.insert(META_PROCESSED, meta.processed_instructions.to_be_bytes().to_vec());
        meta_batch.insert(META_FINGERPRINT, meta.fingerprint.to_vec());

        (
            &self.records,
            &self.mints,
            &self.token_accounts,
            &self.nonces,
            &self.metadata,
        )
            .transaction(|(records, mints, accounts, nonces, metadata)| {
                records.apply_batch(&record_batch)?;
                mints.apply_batch(&mint_batch)?;
                accounts.apply_batch(&account_batch)?;
                nonces.apply_batch(&nonce_batch)?;
                metadata.apply_batch(&meta_batch)?;
                Ok::<(), ConflictableTransactionError<DbError>>(())
            })
            .map_err(|err: TransactionError<DbError>| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => DbError::Sled(err),
            })?;
        self.db.flush()?;

        debug!(
            records = record_count,
            mints = mint_count,
            accounts = account_count,
            processed = meta.processed_instructions,
            "snapshot written"
        );
        Ok(())
    }

    // -- Metadata -----------------------------------------------------------

    /// Number of instructions processed as of the last snapshot.
    pub fn processed_instructions(&self) -> DbResult<u64> {
        match self.metadata.get(META_PROCESSED)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    DbError::Serialization("invalid processed counter bytes".into())
                })?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Stored state fingerprint, if one was written.
    pub fn fingerprint(&self) -> DbResult<Option<[u8; 32]>> {
        match self.metadata.get(META_FINGERPRINT)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| DbError::Serialization("invalid fingerprint bytes".into()))?;
                Ok(Some(arr))
            }
            None => Ok(None),
        }
    }

    /// Whether nothing has ever been written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
            && self.mints.is_empty()
            && self.token_accounts.is_empty()
            && self.nonces.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn encode<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

fn read_tree<T: DeserializeOwned>(tree: &Tree, name: &'static str) -> DbResult<Vec<(Address, T)>> {
    let mut out = Vec::with_capacity(tree.len());
    for entry in tree.iter() {
        let (key, value) = entry?;
        let bytes: [u8; 32] = key
            .as_ref()
            .try_into()
            .map_err(|_| DbError::CorruptKey {
                tree: name,
                len: key.len(),
            })?;
        out.push((Address::new(bytes), decode(&value)?));
    }
    Ok(out)
}

/// The batch that rewrites `tree` to hold exactly `entries`, and the number
/// of live entries.
fn replacement_batch<'a, T, I>(tree: &Tree, entries: I) -> DbResult<(Batch, usize)>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = (&'a Address, &'a T)>,
{
    let mut batch = Batch::default();
    let mut live = BTreeSet::new();
    for (address, value) in entries {
        batch.insert(address.as_bytes().as_slice(), encode(value)?);
        live.insert(*address);
    }
    for key in tree.iter().keys() {
        let key = key?;
        let stale = <[u8; 32]>::try_from(key.as_ref())
            .map(|bytes| !live.contains(&Address::new(bytes)))
            .unwrap_or(true);
        if stale {
            batch.remove(key);
        }
    }
    Ok((batch, live.len()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
