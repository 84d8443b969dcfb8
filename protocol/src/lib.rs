// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Asset Ledger Protocol: World State Library
//!
//! Everything the asset issuance ledger needs underneath its contracts:
//! a keyed world state, a way to group reads and writes into one logical
//! transaction, and a place to stash the event that transaction emits.
//!
//! Consensus, ordering, and replication live outside this crate. What
//! lives here is the contract the surrounding infrastructure must honour:
//! one transaction is one atomic read-validate-write cycle.
//!
//! ## Architecture
//!
//! - **storage::store**: the [`StateStore`] trait plus an in-memory store
//!   for tests and ephemeral hosts.
//! - **storage::db**: [`LedgerDB`], the sled-backed persistent world state.
//! - **storage::context**: [`TxContext`], the per-transaction handle that
//!   buffers writes, carries the timestamp, and releases events on commit.
//! - **config**: protocol constants (keyspace names, event names,
//!   timestamp layouts).
//!
//! ## Design Philosophy
//!
//! 1. Nothing is visible until commit. Writes and events are buffered.
//! 2. No ambient globals. The store and the clock are handed in explicitly.
//! 3. If it touches money, it has tests. Plural.

pub mod config;
pub mod storage;

pub use storage::context::{ContractEvent, TxContext, TxReceipt};
pub use storage::db::LedgerDB;
pub use storage::store::{MemoryStore, StateStore, StoreError, StoreResult, WriteBatch};
