//! # State Store Interface
//!
//! The minimal surface the ledger needs from whatever persists its world
//! state: point reads, point writes, and an atomic batch apply used at
//! commit time. The ledger never lists, scans, or deletes keys, so the
//! trait does not offer those operations.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a state store.
///
/// Everything except [`StoreError::InvalidKey`] is an infrastructure
/// failure. An invalid key is the caller's mistake.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Keys must be non-empty.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The backing store refused the operation for a reason of its own.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Pending writes keyed by world-state key. Ordered so that commits are
/// applied in a deterministic key order.
pub type WriteBatch = BTreeMap<String, Vec<u8>>;

/// Reject keys the world state cannot hold. Only writes are checked; a
/// read of a key that could never have been written is simply absent.
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty",
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// A keyed byte store holding the ledger's world state.
///
/// Implementations must make `apply_batch` atomic: after it returns `Ok`,
/// every entry is visible; after it returns `Err`, none is.
pub trait StateStore {
    /// Read the value stored at `key`, or `None` if the key was never written.
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write a single value outside of any batch.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Atomically apply every write in `batch`.
    fn apply_batch(&mut self, batch: WriteBatch) -> StoreResult<()>;

    /// Apply the write set of transaction `tx_id`. Stores that remember the
    /// last committed transaction record `tx_id` in the same atomic step as
    /// the writes.
    fn commit_batch(&mut self, tx_id: &str, batch: WriteBatch) -> StoreResult<()> {
        let _ = tx_id;
        self.apply_batch(batch)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory world state. Used by tests, benches, and throwaway hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn apply_batch(&mut self, batch: WriteBatch) -> StoreResult<()> {
        // Validate everything up front so a bad key cannot leave half a
        // batch behind.
        for key in batch.keys() {
            validate_key(key)?;
        }
        self.entries.extend(batch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
