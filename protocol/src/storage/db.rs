//! # LedgerDB: Persistent World State
//!
//! The persistence layer for the asset ledger, built on sled's embedded
//! key-value store.
//!
//! ## Tree Layout
//!
//! | Tree          | Key                         | Value                  |
//! |---------------|-----------------------------|------------------------|
//! | `world_state` | investor id / ISIN (UTF-8)  | JSON record            |
//! | `metadata`    | key (UTF-8)                 | value (bytes)          |
//!
//! ## Atomicity
//!
//! A committed transaction reaches sled as one transaction spanning both
//! trees: its `Batch` of world-state records and the `last_tx_id` marker.
//! Either every record it touched and the marker land on disk or none does.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Batch, Db, Transactional, Tree};
use std::path::Path;
use tracing::{debug, error};

use super::store::{validate_key, StateStore, StoreError, StoreResult, WriteBatch};
use crate::config::{META_LAST_TX_ID, METADATA_TREE, WORLD_STATE_TREE};

// ---------------------------------------------------------------------------
// LedgerDB
// ---------------------------------------------------------------------------

/// Persistent world state for the asset ledger.
///
/// Cloning is cheap; clones share the same underlying sled handle. sled
/// itself is thread-safe, but the ledger expects a single writer per key,
/// which the host is responsible for.
#[derive(Debug, Clone)]
pub struct LedgerDB {
    db: Db,
    /// Investor and asset records keyed by natural id.
    world_state: Tree,
    /// Host bookkeeping.
    metadata: Tree,
    /// Flush to disk after every batch.
    flush_on_commit: bool,
}

impl LedgerDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    ///
    /// Used by unit tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let world_state = db.open_tree(WORLD_STATE_TREE)?;
        let metadata = db.open_tree(METADATA_TREE)?;

        Ok(Self {
            db,
            world_state,
            metadata,
            flush_on_commit: true,
        })
    }

    /// Toggle the flush after every committed batch. Off trades durability
    /// of the last few commits for throughput.
    pub fn with_flush_on_commit(mut self, flush: bool) -> Self {
        self.flush_on_commit = flush;
        self
    }

    // -- Metadata operations ------------------------------------------------

    /// Id of the most recently committed transaction, if any.
    pub fn last_tx_id(&self) -> StoreResult<Option<String>> {
        match self.metadata.get(META_LAST_TX_ID)? {
            Some(bytes) => {
                let id = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    StoreError::Unavailable("last tx id is not valid UTF-8".to_string())
                })?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    // -- Utility operations -------------------------------------------------

    /// Number of records in the world state.
    pub fn record_count(&self) -> usize {
        self.world_state.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn flush_if_configured(&self) -> StoreResult<()> {
        if self.flush_on_commit {
            self.db.flush()?;
        }
        Ok(())
    }
}

impl StateStore for LedgerDB {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.world_state.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        self.world_state.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn apply_batch(&mut self, batch: WriteBatch) -> StoreResult<()> {
        let entries = batch.len();
        self.world_state.apply_batch(to_sled_batch(batch)?)?;
        self.flush_if_configured()?;

        debug!(entries, "world state batch applied");
        Ok(())
    }

    fn commit_batch(&mut self, tx_id: &str, batch: WriteBatch) -> StoreResult<()> {
        let entries = batch.len();
        let sled_batch = to_sled_batch(batch)?;

        (&self.world_state, &self.metadata)
            .transaction(|(world_state, metadata)| {
                world_state.apply_batch(&sled_batch)?;
                metadata.insert(META_LAST_TX_ID, tx_id.as_bytes())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Storage(e) => StoreError::Sled(e),
                TransactionError::Abort(()) => {
                    StoreError::Unavailable("commit transaction aborted".to_string())
                }
            })?;
        // The transaction is applied and visible from here on.
        if let Err(e) = self.flush_if_configured() {
            error!(%tx_id, error = %e, "flush after commit failed");
        }

        debug!(%tx_id, entries, "transaction batch committed");
        Ok(())
    }
}

/// Validate every key before anything is staged.
fn to_sled_batch(batch: WriteBatch) -> StoreResult<Batch> {
    let mut sled_batch = Batch::default();
    for (key, value) in batch {
        validate_key(&key)?;
        sled_batch.insert(key.as_bytes(), value);
    }
    Ok(sled_batch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
