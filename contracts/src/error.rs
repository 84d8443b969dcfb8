//! Errors for the asset management contract.
//!
//! Business-rule rejections and infrastructure faults share one enum so the
//! host can surface any of them verbatim. [`ContractError::is_infrastructure`]
//! tells the two apart for logging and metrics.

use assetledger_protocol::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Which kind of record a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Investor,
    Asset,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Investor => write!(f, "investor"),
            EntityKind::Asset => write!(f, "asset"),
        }
    }
}

/// Errors that can occur during asset management operations.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A create targeted a key that already holds a record.
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    /// The referenced investor or asset does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// The order exceeds the asset's per-order maximum.
    #[error("order of {requested} units exceeds the per-order maximum of {max}")]
    OrderTooLarge { requested: u64, max: u64 },

    /// Not enough unissued units left in the asset's pool.
    #[error("insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply { requested: u64, available: u64 },

    /// The investor cannot pay for the order.
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: u64, required: u64 },

    /// The investor holds nothing in this asset.
    #[error("investor {investor_id} has no holdings in {isin}")]
    NoHoldings { investor_id: String, isin: String },

    /// The investor holds fewer units than the redemption asks for.
    #[error("insufficient holdings: held {held}, requested {requested}")]
    InsufficientHoldings { held: u64, requested: u64 },

    /// A stored holding timestamp could not be parsed.
    #[error("malformed subscription timestamp: {value:?}")]
    MalformedTimestamp { value: String },

    /// The holding is still inside its lock-in period.
    #[error("redemption not allowed during the {lock_in_days}-day lock-in period (unlocks at {unlocks_at})")]
    LockInActive {
        lock_in_days: u32,
        unlocks_at: DateTime<Utc>,
    },

    /// The redemption is smaller than the asset's minimum lot.
    #[error("redemption of {requested} units is below the minimum of {min}")]
    BelowMinimumRedemption { requested: u64, min: u64 },

    /// A quantity or amount would not fit in a u64.
    #[error("arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    /// The stored world state contradicts a ledger invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A record could not be encoded or decoded.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The world state could not be read or written.
    #[error("store failure: {0}")]
    Store(StoreError),

    /// Positional arguments did not match the function's signature.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The dispatcher does not know this function name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
}

impl ContractError {
    /// Stable, machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ContractError::AlreadyExists { .. } => "AlreadyExists",
            ContractError::NotFound { .. } => "NotFound",
            ContractError::OrderTooLarge { .. } => "OrderTooLarge",
            ContractError::InsufficientSupply { .. } => "InsufficientSupply",
            ContractError::InsufficientBalance { .. } => "InsufficientBalance",
            ContractError::NoHoldings { .. } => "NoHoldings",
            ContractError::InsufficientHoldings { .. } => "InsufficientHoldings",
            ContractError::MalformedTimestamp { .. } => "MalformedTimestamp",
            ContractError::LockInActive { .. } => "LockInActive",
            ContractError::BelowMinimumRedemption { .. } => "BelowMinimumRedemption",
            ContractError::ArithmeticOverflow(_) => "ArithmeticOverflow",
            ContractError::InvariantViolation(_) => "InvariantViolation",
            ContractError::Serialization(_) => "SerializationFailure",
            ContractError::Store(_) => "StoreIoFailure",
            ContractError::InvalidArguments(_) => "InvalidArguments",
            ContractError::UnknownFunction(_) => "UnknownFunction",
        }
    }

    /// `true` for faults in the machinery rather than in the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ContractError::Serialization(_)
                | ContractError::Store(_)
                | ContractError::InvariantViolation(_)
        )
    }

    pub(crate) fn investor_not_found(id: &str) -> Self {
        ContractError::NotFound {
            kind: EntityKind::Investor,
            id: id.to_string(),
        }
    }

    pub(crate) fn asset_not_found(id: &str) -> Self {
        ContractError::NotFound {
            kind: EntityKind::Asset,
            id: id.to_string(),
        }
    }
}

/// A key the store refuses to hold came from the caller's arguments, so it
/// is reported as such. Everything else the store raises is a fault.
impl From<StoreError> for ContractError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidKey { key, reason } => {
                ContractError::InvalidArguments(format!("invalid key {key:?}: {reason}"))
            }
            other => ContractError::Store(other),
        }
    }
}
