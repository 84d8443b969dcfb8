//! # Positional Invocation
//!
//! Hosts hand the ledger a function name and a list of string arguments,
//! the way a chaincode runtime does. This module turns that into a typed
//! [`Invocation`] and runs it against the contract.
//!
//! | Function         | Arguments                                                         |
//! |------------------|-------------------------------------------------------------------|
//! | `CreateUser`     | investor_id, balance                                              |
//! | `RegisterAsset`  | isin, company, type, total, price, max_order, min_redeem, lock_in |
//! | `SubscribeAsset` | isin, units, investor_id                                          |
//! | `RedeemAsset`    | isin, units, investor_id                                          |
//! | `GetPortfolio`   | investor_id                                                       |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use assetledger_protocol::{StateStore, TxContext};

use crate::asset_management::AssetManagementContract;
use crate::error::ContractError;
use crate::records;

/// A parsed, typed contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function")]
pub enum Invocation {
    CreateUser {
        investor_id: String,
        balance: u64,
    },
    RegisterAsset {
        isin: String,
        company_name: String,
        asset_type: String,
        total_units: u64,
        price_per_unit: u64,
        max_allowed_units: u64,
        min_redeem_units: u64,
        lock_in_period_days: u32,
    },
    SubscribeAsset {
        isin: String,
        units: u64,
        investor_id: String,
    },
    RedeemAsset {
        isin: String,
        units: u64,
        investor_id: String,
    },
    GetPortfolio {
        investor_id: String,
    },
}

impl Invocation {
    /// Parse `function(args...)`.
    ///
    /// # Errors
    ///
    /// [`ContractError::UnknownFunction`] for an unrecognised name,
    /// [`ContractError::InvalidArguments`] for a wrong argument count or an
    /// argument that is not a non-negative integer where one is expected.
    pub fn parse<A: AsRef<str>>(function: &str, args: &[A]) -> Result<Self, ContractError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();

        match function {
            "CreateUser" => {
                expect_arity(function, &args, 2)?;
                Ok(Invocation::CreateUser {
                    investor_id: args[0].to_string(),
                    balance: integer("balance", args[1])?,
                })
            }
            "RegisterAsset" => {
                expect_arity(function, &args, 8)?;
                Ok(Invocation::RegisterAsset {
                    isin: args[0].to_string(),
                    company_name: args[1].to_string(),
                    asset_type: args[2].to_string(),
                    total_units: integer("total_units", args[3])?,
                    price_per_unit: integer("price_per_unit", args[4])?,
                    max_allowed_units: integer("max_allowed_units", args[5])?,
                    min_redeem_units: integer("min_redeem_units", args[6])?,
                    lock_in_period_days: integer("lock_in_period_days", args[7])?,
                })
            }
            "SubscribeAsset" => {
                expect_arity(function, &args, 3)?;
                Ok(Invocation::SubscribeAsset {
                    isin: args[0].to_string(),
                    units: integer("units", args[1])?,
                    investor_id: args[2].to_string(),
                })
            }
            "RedeemAsset" => {
                expect_arity(function, &args, 3)?;
                Ok(Invocation::RedeemAsset {
                    isin: args[0].to_string(),
                    units: integer("units", args[1])?,
                    investor_id: args[2].to_string(),
                })
            }
            "GetPortfolio" => {
                expect_arity(function, &args, 1)?;
                Ok(Invocation::GetPortfolio {
                    investor_id: args[0].to_string(),
                })
            }
            other => Err(ContractError::UnknownFunction(other.to_string())),
        }
    }

    /// The function name this invocation dispatches to.
    pub fn function_name(&self) -> &'static str {
        match self {
            Invocation::CreateUser { .. } => "CreateUser",
            Invocation::RegisterAsset { .. } => "RegisterAsset",
            Invocation::SubscribeAsset { .. } => "SubscribeAsset",
            Invocation::RedeemAsset { .. } => "RedeemAsset",
            Invocation::GetPortfolio { .. } => "GetPortfolio",
        }
    }

    /// `true` if the invocation never writes.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Invocation::GetPortfolio { .. })
    }
}

/// Run an invocation inside `tx`.
///
/// Mutations return `None`. `GetPortfolio` returns the JSON-encoded
/// holdings map. The caller decides whether to commit.
pub fn invoke<S: StateStore + ?Sized>(
    contract: &AssetManagementContract,
    tx: &mut TxContext<'_, S>,
    invocation: &Invocation,
) -> Result<Option<Vec<u8>>, ContractError> {
    match invocation {
        Invocation::CreateUser {
            investor_id,
            balance,
        } => contract.create_investor(tx, investor_id, *balance).map(|_| None),
        Invocation::RegisterAsset {
            isin,
            company_name,
            asset_type,
            total_units,
            price_per_unit,
            max_allowed_units,
            min_redeem_units,
            lock_in_period_days,
        } => contract
            .register_asset(
                tx,
                isin,
                company_name,
                asset_type,
                *total_units,
                *price_per_unit,
                *max_allowed_units,
                *min_redeem_units,
                *lock_in_period_days,
            )
            .map(|_| None),
        Invocation::SubscribeAsset {
            isin,
            units,
            investor_id,
        } => contract.subscribe(tx, isin, *units, investor_id).map(|_| None),
        Invocation::RedeemAsset {
            isin,
            units,
            investor_id,
        } => contract.redeem(tx, isin, *units, investor_id).map(|_| None),
        Invocation::GetPortfolio { investor_id } => {
            let portfolio = contract.get_portfolio(tx, investor_id)?;
            Ok(Some(records::encode(&portfolio)?))
        }
    }
}

fn expect_arity(function: &str, args: &[&str], expected: usize) -> Result<(), ContractError> {
    if args.len() != expected {
        return Err(ContractError::InvalidArguments(format!(
            "{function} takes {expected} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

fn integer<T: FromStr>(name: &str, raw: &str) -> Result<T, ContractError> {
    raw.trim().parse::<T>().map_err(|_| {
        ContractError::InvalidArguments(format!(
            "{name} must be a non-negative integer, got {raw:?}"
        ))
    })
}
