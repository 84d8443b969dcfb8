//! # Transaction Context
//!
//! A [`TxContext`] is the only handle a contract gets on the world state.
//! It is created by the host for exactly one invocation and carries:
//!
//! - a borrowed [`StateStore`] for reads,
//! - a write set that buffers every `put_state` until commit,
//! - the transaction id and timestamp assigned by the host,
//! - at most one pending event.
//!
//! Reads consult the write set before the store, so a contract always sees
//! its own writes. Nothing reaches the store, and no event is released,
//! until [`TxContext::commit`] succeeds. Dropping a context without
//! committing discards everything it buffered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::store::{validate_key, StateStore, StoreResult, WriteBatch};

// ---------------------------------------------------------------------------
// Events & Receipts
// ---------------------------------------------------------------------------

/// A named notification produced by a transaction.
///
/// The payload is opaque to the protocol layer; contracts decide its
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Event name listeners subscribe to.
    pub name: String,
    /// Encoded event body.
    pub payload: Vec<u8>,
}

/// What a successful commit hands back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// The committed transaction's id.
    pub tx_id: String,
    /// The timestamp the transaction executed under.
    pub timestamp: DateTime<Utc>,
    /// Keys written by the transaction, in commit order.
    pub keys_written: Vec<String>,
    /// The event released by the commit, if the transaction set one.
    pub event: Option<ContractEvent>,
}

// ---------------------------------------------------------------------------
// TxContext
// ---------------------------------------------------------------------------

/// Per-transaction view over a state store.
pub struct TxContext<'a, S: StateStore + ?Sized> {
    store: &'a mut S,
    tx_id: String,
    timestamp: DateTime<Utc>,
    write_set: WriteBatch,
    event: Option<ContractEvent>,
}

impl<'a, S: StateStore + ?Sized> TxContext<'a, S> {
    /// Open a transaction with a freshly generated id.
    pub fn new(store: &'a mut S, timestamp: DateTime<Utc>) -> Self {
        Self::with_tx_id(store, Uuid::new_v4().to_string(), timestamp)
    }

    /// Open a transaction with an id chosen by the caller (replay, tests).
    pub fn with_tx_id(store: &'a mut S, tx_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            store,
            tx_id,
            timestamp,
            write_set: WriteBatch::new(),
            event: None,
        }
    }

    /// The transaction id.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// The timestamp this transaction executes under. Every read of "now"
    /// inside a contract must come from here so that replays agree.
    pub fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Read a key, seeing this transaction's own pending writes first.
    pub fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if let Some(pending) = self.write_set.get(key) {
            return Ok(Some(pending.clone()));
        }
        self.store.get_state(key)
    }

    /// Buffer a write. Visible to later reads in this transaction only.
    pub fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        self.write_set.insert(key.to_string(), value);
        Ok(())
    }

    /// Set the event released on commit. A transaction carries at most one
    /// event; a later call replaces an earlier one.
    pub fn set_event(&mut self, name: impl Into<String>, payload: Vec<u8>) {
        self.event = Some(ContractEvent {
            name: name.into(),
            payload,
        });
    }

    /// Number of keys waiting to be written.
    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }

    /// The event that will be released on commit, if any.
    pub fn pending_event(&self) -> Option<&ContractEvent> {
        self.event.as_ref()
    }

    /// Apply the write set atomically and release the pending event.
    ///
    /// On error nothing was written and the event is dropped with the
    /// context. A transaction that wrote nothing never reaches the store.
    pub fn commit(self) -> StoreResult<TxReceipt> {
        let keys_written: Vec<String> = self.write_set.keys().cloned().collect();

        if !self.write_set.is_empty() {
            self.store.commit_batch(&self.tx_id, self.write_set)?;
        }

        debug!(
            tx_id = %self.tx_id,
            keys = keys_written.len(),
            event = self.event.as_ref().map(|e| e.name.as_str()).unwrap_or("-"),
            "transaction committed"
        );

        Ok(TxReceipt {
            tx_id: self.tx_id,
            timestamp: self.timestamp,
            keys_written,
            event: self.event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
