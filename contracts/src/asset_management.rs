//! # Asset Management Contract
//!
//! Issuance and redemption of asset units against investor cash.
//!
//! 1. **CreateUser**: open an investor account with an initial balance.
//! 2. **RegisterAsset**: issue a new asset; all units start available.
//! 3. **SubscribeAsset**: move units from the asset's pool into an
//!    investor's holding, paying `units × price` out of the balance.
//! 4. **RedeemAsset**: move units back into the pool once the holding's
//!    lock-in has passed, crediting `units × price` to the balance.
//! 5. **GetPortfolio**: read an investor's holdings.
//!
//! Every mutating operation follows the same shape: read the records,
//! check every precondition in a fixed order, compute the new records with
//! checked arithmetic, and only then write them back and set the event.
//! The first failing check decides the error, and a failed check means no
//! write was ever buffered.
//!
//! ## Lock-in policy
//!
//! A subscription overwrites the holding's timestamp, so adding to a
//! position restarts the lock-in clock for all of it, not just the new
//! units. Elapsed time is measured against the transaction timestamp and
//! compared as a duration: `now - subscribed_at >= lock_in_period_days`.

use tracing::{error, info, warn};

use assetledger_protocol::config::{EVENT_ASSET_REDEEMED, EVENT_ASSET_SUBSCRIBED};
use assetledger_protocol::{StateStore, TxContext};

use crate::error::{ContractError, EntityKind};
use crate::records::{self, Asset, AssetSubscription, Investor, Portfolio};
use crate::timestamp::{format_timestamp, lock_in_elapsed, parse_timestamp, unlocks_at};

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The asset issuance and redemption ledger.
///
/// Stateless: everything lives in the world state reached through the
/// [`TxContext`] passed to each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetManagementContract;

impl AssetManagementContract {
    /// Creates the contract.
    pub fn new() -> Self {
        Self
    }

    /// Opens an investor account.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyExists`] if `investor_id` already
    /// holds a record.
    pub fn create_investor<S: StateStore + ?Sized>(
        &self,
        tx: &mut TxContext<'_, S>,
        investor_id: &str,
        balance: u64,
    ) -> Result<(), ContractError> {
        let result = (|| -> Result<(), ContractError> {
            if tx.get_state(investor_id)?.is_some() {
                return Err(ContractError::AlreadyExists {
                    kind: EntityKind::Investor,
                    id: investor_id.to_string(),
                });
            }

            let investor = Investor::new(investor_id, balance);
            tx.put_state(investor_id, records::encode(&investor)?)?;
            Ok(())
        })();

        if result.is_ok() {
            info!(investor_id, balance, "investor created");
        }
        traced("CreateUser", result)
    }

    /// Registers a new asset with every issued unit available.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyExists`] if `isin` already holds a
    /// record.
    #[allow(clippy::too_many_arguments)]
    pub fn register_asset<S: StateStore + ?Sized>(
        &self,
        tx: &mut TxContext<'_, S>,
        isin: &str,
        company_name: &str,
        asset_type: &str,
        total_units: u64,
        price_per_unit: u64,
        max_allowed_units: u64,
        min_redeem_units: u64,
        lock_in_period_days: u32,
    ) -> Result<(), ContractError> {
        let result = (|| -> Result<(), ContractError> {
            if tx.get_state(isin)?.is_some() {
                return Err(ContractError::AlreadyExists {
                    kind: EntityKind::Asset,
                    id: isin.to_string(),
                });
            }

            let asset = Asset {
                isin: isin.to_string(),
                company_name: company_name.to_string(),
                asset_type: asset_type.to_string(),
                total_units,
                price_per_unit,
                available_units: total_units,
                max_allowed_units,
                min_redeem_units,
                lock_in_period_days,
            };
            tx.put_state(isin, records::encode(&asset)?)?;
            Ok(())
        })();

        if result.is_ok() {
            info!(isin, total_units, price_per_unit, "asset registered");
        }
        traced("RegisterAsset", result)
    }

    /// Subscribes `investor_id` to `units` of `isin`.
    ///
    /// Checks, in order: investor exists, asset exists, order within the
    /// per-order maximum, enough units available, enough balance.
    ///
    /// # Errors
    ///
    /// [`ContractError::NotFound`], [`ContractError::OrderTooLarge`],
    /// [`ContractError::InsufficientSupply`],
    /// [`ContractError::InsufficientBalance`], or an infrastructure error.
    pub fn subscribe<S: StateStore + ?Sized>(
        &self,
        tx: &mut TxContext<'_, S>,
        isin: &str,
        units: u64,
        investor_id: &str,
    ) -> Result<(), ContractError> {
        let result = (|| -> Result<(), ContractError> {
            let (mut investor, mut asset) = load_pair(tx, isin, investor_id)?;

            if units > asset.max_allowed_units {
                return Err(ContractError::OrderTooLarge {
                    requested: units,
                    max: asset.max_allowed_units,
                });
            }
            if units > asset.available_units {
                return Err(ContractError::InsufficientSupply {
                    requested: units,
                    available: asset.available_units,
                });
            }
            let cost = units
                .checked_mul(asset.price_per_unit)
                .ok_or(ContractError::ArithmeticOverflow("subscription cost"))?;
            if investor.balance < cost {
                return Err(ContractError::InsufficientBalance {
                    balance: investor.balance,
                    required: cost,
                });
            }

            let mut holding = investor.holding_or_default(isin);
            let new_units = holding
                .units
                .checked_add(units)
                .ok_or(ContractError::ArithmeticOverflow("holding units"))?;

            // Validation done. Nothing below rejects on business grounds.
            let timestamp = format_timestamp(tx.tx_timestamp());
            asset.available_units -= units;
            investor.balance -= cost;
            holding.units = new_units;
            holding.subscribed_timestamp = timestamp.clone();
            investor.holdings.insert(isin.to_string(), holding);

            tx.put_state(isin, records::encode(&asset)?)?;
            tx.put_state(investor_id, records::encode(&investor)?)?;
            emit(tx, EVENT_ASSET_SUBSCRIBED, isin, investor_id, units, timestamp)?;

            info!(
                isin,
                investor_id,
                units,
                cost,
                available = asset.available_units,
                "asset subscribed"
            );
            Ok(())
        })();

        traced("SubscribeAsset", result)
    }

    /// Redeems `units` of `isin` held by `investor_id`.
    ///
    /// Checks, in order: investor exists, asset exists, a holding exists,
    /// enough units held, holding timestamp parses, lock-in elapsed,
    /// redemption at least the minimum lot.
    ///
    /// # Errors
    ///
    /// [`ContractError::NotFound`], [`ContractError::NoHoldings`],
    /// [`ContractError::InsufficientHoldings`],
    /// [`ContractError::MalformedTimestamp`], [`ContractError::LockInActive`],
    /// [`ContractError::BelowMinimumRedemption`], or an infrastructure error.
    pub fn redeem<S: StateStore + ?Sized>(
        &self,
        tx: &mut TxContext<'_, S>,
        isin: &str,
        units: u64,
        investor_id: &str,
    ) -> Result<(), ContractError> {
        let result = (|| -> Result<(), ContractError> {
            let (mut investor, mut asset) = load_pair(tx, isin, investor_id)?;

            let mut holding = investor
                .holding(isin)
                .cloned()
                .ok_or_else(|| ContractError::NoHoldings {
                    investor_id: investor_id.to_string(),
                    isin: isin.to_string(),
                })?;

            if holding.units < units {
                return Err(ContractError::InsufficientHoldings {
                    held: holding.units,
                    requested: units,
                });
            }

            let subscribed_at = parse_timestamp(&holding.subscribed_timestamp)?;
            if !lock_in_elapsed(&asset, subscribed_at, tx.tx_timestamp()) {
                return Err(ContractError::LockInActive {
                    lock_in_days: asset.lock_in_period_days,
                    unlocks_at: unlocks_at(&asset, subscribed_at),
                });
            }

            if units < asset.min_redeem_units {
                return Err(ContractError::BelowMinimumRedemption {
                    requested: units,
                    min: asset.min_redeem_units,
                });
            }

            let new_available = asset
                .available_units
                .checked_add(units)
                .ok_or(ContractError::ArithmeticOverflow("available units"))?;
            if new_available > asset.total_units {
                return Err(ContractError::InvariantViolation(format!(
                    "redeeming {units} units of {isin} would raise available units to \
                     {new_available}, above the {} issued ({} outstanding)",
                    asset.total_units,
                    asset.outstanding_units()
                )));
            }
            let proceeds = units
                .checked_mul(asset.price_per_unit)
                .ok_or(ContractError::ArithmeticOverflow("redemption proceeds"))?;
            let new_balance = investor
                .balance
                .checked_add(proceeds)
                .ok_or(ContractError::ArithmeticOverflow("investor balance"))?;

            // Validation done. Nothing below rejects on business grounds.
            asset.available_units = new_available;
            investor.balance = new_balance;
            holding.units -= units;
            investor.holdings.insert(isin.to_string(), holding);

            let timestamp = format_timestamp(tx.tx_timestamp());
            tx.put_state(isin, records::encode(&asset)?)?;
            tx.put_state(investor_id, records::encode(&investor)?)?;
            emit(tx, EVENT_ASSET_REDEEMED, isin, investor_id, units, timestamp)?;

            info!(
                isin,
                investor_id,
                units,
                proceeds,
                available = asset.available_units,
                "asset redeemed"
            );
            Ok(())
        })();

        traced("RedeemAsset", result)
    }

    /// Returns the investor's holdings keyed by ISIN.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NotFound`] if the investor does not exist.
    pub fn get_portfolio<S: StateStore + ?Sized>(
        &self,
        tx: &TxContext<'_, S>,
        investor_id: &str,
    ) -> Result<Portfolio, ContractError> {
        let result = self.get_investor(tx, investor_id).map(|i| i.holdings);
        traced("GetPortfolio", result)
    }

    /// Reads an investor record.
    pub fn get_investor<S: StateStore + ?Sized>(
        &self,
        tx: &TxContext<'_, S>,
        investor_id: &str,
    ) -> Result<Investor, ContractError> {
        let bytes = tx
            .get_state(investor_id)?
            .ok_or_else(|| ContractError::investor_not_found(investor_id))?;
        decode_expecting::<Investor, Asset>(&bytes, || ContractError::investor_not_found(investor_id))
    }

    /// Reads an asset record.
    pub fn get_asset<S: StateStore + ?Sized>(
        &self,
        tx: &TxContext<'_, S>,
        isin: &str,
    ) -> Result<Asset, ContractError> {
        let bytes = tx
            .get_state(isin)?
            .ok_or_else(|| ContractError::asset_not_found(isin))?;
        decode_expecting::<Asset, Investor>(&bytes, || ContractError::asset_not_found(isin))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode a record that should be a `T`. Investors and assets share one key
/// space, so bytes that decode as the other kind `U` mean the caller named
/// the wrong entity; that is reported through `missing`, not as corruption.
fn decode_expecting<T, U>(
    bytes: &[u8],
    missing: impl FnOnce() -> ContractError,
) -> Result<T, ContractError>
where
    T: serde::de::DeserializeOwned,
    U: serde::de::DeserializeOwned,
{
    records::decode::<T>(bytes).map_err(|err| {
        if records::decode::<U>(bytes).is_ok() {
            missing()
        } else {
            err
        }
    })
}

/// Investor first, then asset: the existence checks run in that order and
/// decoding only happens once both records are known to exist.
fn load_pair<S: StateStore + ?Sized>(
    tx: &TxContext<'_, S>,
    isin: &str,
    investor_id: &str,
) -> Result<(Investor, Asset), ContractError> {
    let investor_bytes = tx
        .get_state(investor_id)?
        .ok_or_else(|| ContractError::investor_not_found(investor_id))?;
    let asset_bytes = tx
        .get_state(isin)?
        .ok_or_else(|| ContractError::asset_not_found(isin))?;

    let investor = decode_expecting::<Investor, Asset>(&investor_bytes, || {
        ContractError::investor_not_found(investor_id)
    })?;
    let asset = decode_expecting::<Asset, Investor>(&asset_bytes, || {
        ContractError::asset_not_found(isin)
    })?;
    Ok((investor, asset))
}

fn emit<S: StateStore + ?Sized>(
    tx: &mut TxContext<'_, S>,
    name: &str,
    isin: &str,
    investor_id: &str,
    units: u64,
    timestamp: String,
) -> Result<(), ContractError> {
    let payload = AssetSubscription {
        isin: isin.to_string(),
        investor_id: investor_id.to_string(),
        units,
        timestamp,
    };
    tx.set_event(name, records::encode(&payload)?);
    Ok(())
}

/// Log a failed operation at a level matching who is at fault.
fn traced<T>(function: &str, result: Result<T, ContractError>) -> Result<T, ContractError> {
    if let Err(e) = &result {
        if e.is_infrastructure() {
            error!(function, code = e.code(), error = %e, "operation failed");
        } else {
            warn!(function, code = e.code(), error = %e, "operation rejected");
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
