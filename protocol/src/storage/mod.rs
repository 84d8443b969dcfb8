//! # Storage Module
//!
//! The world state for the asset ledger, plus the transaction handle the
//! contracts read and write through.
//!
//! ## Architecture
//!
//! ```text
//! store.rs   : StateStore trait, WriteBatch, in-memory store
//! db.rs      : sled persistence (world_state + metadata trees)
//! context.rs : TxContext: write set, tx timestamp, pending event, commit
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! contract op → TxContext (buffered) → commit → StateStore::apply_batch
//!                                          ↓
//!                                      TxReceipt (event released)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **The id is the key.** Investors and assets share one keyspace and
//!    are addressed by their natural identifier. No secondary indices.
//!
//! 2. **One batch per transaction.** Every write a transaction makes lands
//!    in a single atomic batch, or none of them do.
//!
//! 3. **JSON on disk.** Records are small and humans read them during
//!    incident response. Compactness is not the bottleneck here.

pub mod context;
pub mod db;
pub mod store;

pub use context::{ContractEvent, TxContext, TxReceipt};
pub use db::LedgerDB;
pub use store::{MemoryStore, StateStore, StoreError, StoreResult, WriteBatch};
