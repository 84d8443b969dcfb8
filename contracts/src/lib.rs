// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Asset Ledger Contracts
//!
//! The issuance and redemption logic of the asset ledger. Investors hold
//! cash and unit holdings; assets hold a fixed issued supply of which some
//! part is still available. Every operation reads the records it needs
//! through a [`TxContext`](assetledger_protocol::TxContext), validates,
//! and only then writes.
//!
//! - **Asset Management**: create investors, register assets, subscribe,
//!   redeem, and query portfolios.
//! - **Records**: the persisted investor / asset / holding layouts and the
//!   event payload.
//! - **Timestamps**: the holding timestamp codec and the lock-in check.
//! - **Dispatch**: positional, string-encoded invocation by function name.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow. `checked_add`,
//!    `checked_sub`, `checked_mul` everywhere.
//! 2. Validate everything, then mutate. A rejected operation leaves no
//!    trace in the world state.
//! 3. "Now" is the transaction timestamp, never the wall clock.
//! 4. Every public type is serializable (serde) for storage and events.

pub mod asset_management;
pub mod dispatch;
pub mod error;
pub mod records;
pub mod timestamp;

pub use asset_management::AssetManagementContract;
pub use dispatch::{invoke, Invocation};
pub use error::{ContractError, EntityKind};
pub use records::{Asset, AssetSubscription, Holding, Investor, Portfolio};
