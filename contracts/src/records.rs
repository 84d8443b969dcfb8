//! # Ledger Records
//!
//! The persisted shapes of investors and assets, the holding an investor
//! keeps per asset, and the payload carried by subscription / redemption
//! events. Field names are part of the stored format.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use assetledger_protocol::config::SECONDS_PER_DAY;

use crate::error::ContractError;

/// An investor's holdings keyed by ISIN.
pub type Portfolio = BTreeMap<String, Holding>;

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A tradable instrument.
///
/// `total_units` never changes after registration. `available_units` moves
/// down on subscription and back up on redemption, and always stays within
/// `0..=total_units`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// ISIN-like identifier; also the world-state key.
    pub isin: String,
    /// Issuer name.
    pub company_name: String,
    /// Asset class tag (e.g. "bond", "equity").
    pub asset_type: String,
    /// Units issued at registration.
    pub total_units: u64,
    /// Price of one unit in minor currency units.
    pub price_per_unit: u64,
    /// Units not currently held by any investor.
    pub available_units: u64,
    /// Largest subscription accepted in a single order.
    pub max_allowed_units: u64,
    /// Smallest redemption accepted in a single order.
    pub min_redeem_units: u64,
    /// Days a holding must age before any of it may be redeemed.
    pub lock_in_period_days: u32,
}

impl Asset {
    /// The lock-in period as a duration.
    pub fn lock_in_period(&self) -> Duration {
        Duration::seconds(i64::from(self.lock_in_period_days) * SECONDS_PER_DAY)
    }

    /// Units currently out with investors.
    pub fn outstanding_units(&self) -> u64 {
        self.total_units.saturating_sub(self.available_units)
    }
}

// ---------------------------------------------------------------------------
// Holding
// ---------------------------------------------------------------------------

/// An investor's position in one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub isin: String,
    /// Units held; accumulates across subscriptions.
    pub units: u64,
    /// Timestamp of the most recent subscription to this asset. Overwritten,
    /// not accumulated: every subscription restarts the lock-in clock for
    /// the whole position.
    pub subscribed_timestamp: String,
}

impl Holding {
    /// A zero-unit holding with no subscription history.
    pub fn empty(isin: &str) -> Self {
        Self {
            isin: isin.to_string(),
            units: 0,
            subscribed_timestamp: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Investor
// ---------------------------------------------------------------------------

/// An investor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    /// Investor identifier; also the world-state key.
    pub investor_id: String,
    /// Cash balance in minor currency units.
    pub balance: u64,
    /// One holding per asset the investor has ever subscribed to.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub holdings: Portfolio,
}

impl Investor {
    /// A fresh investor with no holdings.
    pub fn new(investor_id: &str, balance: u64) -> Self {
        Self {
            investor_id: investor_id.to_string(),
            balance,
            holdings: Portfolio::new(),
        }
    }

    /// The holding for `isin`, if the investor has ever subscribed to it.
    pub fn holding(&self, isin: &str) -> Option<&Holding> {
        self.holdings.get(isin)
    }

    /// The holding for `isin`, or a zero-unit holding if there is none.
    pub fn holding_or_default(&self, isin: &str) -> Holding {
        self.holdings
            .get(isin)
            .cloned()
            .unwrap_or_else(|| Holding::empty(isin))
    }
}

/// Older records store an investor without holdings as `"holdings": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Portfolio, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Portfolio>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Payload of `AssetSubscribed` and `AssetRedeemed` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSubscription {
    pub isin: String,
    pub investor_id: String,
    pub units: u64,
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Encode a record for the world state.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, ContractError> {
    Ok(serde_json::to_vec(record)?)
}

/// Decode a record read from the world state.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ContractError> {
    Ok(serde_json::from_slice(bytes)?)
}
