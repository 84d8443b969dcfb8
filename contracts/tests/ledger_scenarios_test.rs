//! Integration tests for the asset management contract.
//!
//! These walk the ledger through its lifecycle end to end:
//! each call runs in its own transaction against a fresh in-memory world
//! state and is committed only when it succeeds, the way a host would.

use chrono::{DateTime, Duration, TimeZone, Utc};

use assetledger_contracts::records::decode;
use assetledger_contracts::timestamp::format_timestamp;
use assetledger_contracts::{
    invoke, Asset, AssetManagementContract, AssetSubscription, ContractError, Investor,
    Invocation,
};
use assetledger_protocol::config::{EVENT_ASSET_REDEEMED, EVENT_ASSET_SUBSCRIBED};
use assetledger_protocol::{MemoryStore, StateStore, TxContext, TxReceipt};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A minimal host: one invocation, one transaction, commit on success.
struct Host {
    contract: AssetManagementContract,
    store: MemoryStore,
}

impl Host {
    fn new() -> Self {
        Self {
            contract: AssetManagementContract::new(),
            store: MemoryStore::new(),
        }
    }

    fn call(&mut self, at: DateTime<Utc>, function: &str, args: &[&str]) -> Result<TxReceipt, ContractError> {
        let invocation = Invocation::parse(function, args)?;
        let mut tx = TxContext::new(&mut self.store, at);
        invoke(&self.contract, &mut tx, &invocation)?;
        Ok(tx.commit()?)
    }

    fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get_state(key).unwrap()
    }

    fn investor(&self, id: &str) -> Investor {
        decode(&self.raw(id).expect("investor exists")).unwrap()
    }

    fn asset(&self, isin: &str) -> Asset {
        decode(&self.raw(isin).expect("asset exists")).unwrap()
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

/// inv1 with 1000, A1 (100 @ 10, max 50, min 5, no lock-in),
/// inv1 subscribes to 20.
fn with_first_subscription() -> Host {
    let mut host = Host::new();
    host.call(t0(), "CreateUser", &["inv1", "1000"]).unwrap();
    host.call(
        t0(),
        "RegisterAsset",
        &["A1", "company1", "bond", "100", "10", "50", "5", "0"],
    )
    .unwrap();
    host.call(t0(), "SubscribeAsset", &["A1", "20", "inv1"]).unwrap();
    host
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn subscribe_moves_units_into_holding() {
    let host = with_first_subscription();

    assert_eq!(host.asset("A1").available_units, 80);
    let inv = host.investor("inv1");
    assert_eq!(inv.balance, 800);
    assert_eq!(inv.holding("A1").unwrap().units, 20);
}

#[test]
fn subscribe_emits_asset_subscribed() {
    let mut host = Host::new();
    host.call(t0(), "CreateUser", &["inv1", "1000"]).unwrap();
    host.call(
        t0(),
        "RegisterAsset",
        &["A1", "company1", "bond", "100", "10", "50", "5", "0"],
    )
    .unwrap();

    let receipt = host.call(t0(), "SubscribeAsset", &["A1", "20", "inv1"]).unwrap();
    let event = receipt.event.expect("subscribe emits an event");
    assert_eq!(event.name, EVENT_ASSET_SUBSCRIBED);

    let payload: AssetSubscription = decode(&event.payload).unwrap();
    assert_eq!(
        payload,
        AssetSubscription {
            isin: "A1".into(),
            investor_id: "inv1".into(),
            units: 20,
            timestamp: format_timestamp(t0()),
        }
    );
}

#[test]
fn order_too_large_leaves_state_unchanged() {
    let mut host = with_first_subscription();
    let asset_before = host.raw("A1");
    let investor_before = host.raw("inv1");

    let err = host.call(t0(), "SubscribeAsset", &["A1", "60", "inv1"]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::OrderTooLarge {
            requested: 60,
            max: 50
        }
    ));

    assert_eq!(host.raw("A1"), asset_before);
    assert_eq!(host.raw("inv1"), investor_before);
}

#[test]
fn redemption_below_minimum_lot() {
    let mut host = with_first_subscription();
    let err = host.call(t0(), "RedeemAsset", &["A1", "3", "inv1"]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::BelowMinimumRedemption {
            requested: 3,
            min: 5
        }
    ));
}

#[test]
fn redeem_returns_units_and_cash() {
    let mut host = with_first_subscription();
    let at = t0() + Duration::minutes(1);

    let receipt = host.call(at, "RedeemAsset", &["A1", "10", "inv1"]).unwrap();

    assert_eq!(host.asset("A1").available_units, 90);
    let inv = host.investor("inv1");
    assert_eq!(inv.balance, 900);
    assert_eq!(inv.holding("A1").unwrap().units, 10);

    let event = receipt.event.expect("redeem emits an event");
    assert_eq!(event.name, EVENT_ASSET_REDEEMED);
    let payload: AssetSubscription = decode(&event.payload).unwrap();
    assert_eq!(payload.isin, "A1");
    assert_eq!(payload.investor_id, "inv1");
    assert_eq!(payload.units, 10);
    assert_eq!(payload.timestamp, format_timestamp(at));
}

#[test]
fn portfolio_of_unknown_investor() {
    let mut host = Host::new();
    let err = host.call(t0(), "GetPortfolio", &["nobody"]).unwrap_err();
    assert_eq!(err.code(), "NotFound");
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn second_create_is_rejected_and_first_record_kept() {
    let mut host = Host::new();
    host.call(t0(), "CreateUser", &["inv1", "1000"]).unwrap();
    let before = host.raw("inv1");

    let err = host.call(t0(), "CreateUser", &["inv1", "5"]).unwrap_err();
    assert_eq!(err.code(), "AlreadyExists");
    assert_eq!(host.raw("inv1"), before);

    host.call(t0(), "RegisterAsset", &["A1", "c", "bond", "100", "10", "50", "5", "0"])
        .unwrap();
    let before = host.raw("A1");
    let err = host
        .call(t0(), "RegisterAsset", &["A1", "d", "equity", "1", "1", "1", "1", "1"])
        .unwrap_err();
    assert_eq!(err.code(), "AlreadyExists");
    assert_eq!(host.raw("A1"), before);
}

#[test]
fn conservation_across_investors() {
    let mut host = Host::new();
    host.call(t0(), "RegisterAsset", &["A1", "c", "bond", "100", "10", "50", "5", "0"])
        .unwrap();
    for id in ["inv1", "inv2", "inv3"] {
        host.call(t0(), "CreateUser", &[id, "10000"]).unwrap();
    }

    host.call(t0(), "SubscribeAsset", &["A1", "40", "inv1"]).unwrap();
    host.call(t0(), "SubscribeAsset", &["A1", "35", "inv2"]).unwrap();
    host.call(t0(), "SubscribeAsset", &["A1", "25", "inv3"]).unwrap();
    // Pool is empty now.
    let err = host.call(t0(), "SubscribeAsset", &["A1", "1", "inv1"]).unwrap_err();
    assert_eq!(err.code(), "InsufficientSupply");

    host.call(t0(), "RedeemAsset", &["A1", "15", "inv2"]).unwrap();

    let held: u64 = ["inv1", "inv2", "inv3"]
        .iter()
        .map(|id| host.investor(id).holding("A1").map_or(0, |h| h.units))
        .sum();
    let asset = host.asset("A1");
    assert_eq!(asset.outstanding_units(), held);
    assert_eq!(asset.available_units, 15);
}

#[test]
fn lock_in_gate_over_days() {
    let mut host = Host::new();
    host.call(t0(), "CreateUser", &["investor3", "1000000000"]).unwrap();
    host.call(
        t0(),
        "RegisterAsset",
        &["asset3", "company1", "bond", "300", "10", "30", "10", "7"],
    )
    .unwrap();
    host.call(t0(), "SubscribeAsset", &["asset3", "30", "investor3"]).unwrap();

    // Redeeming right away, as the original client did, hits the lock-in.
    let err = host
        .call(t0() + Duration::seconds(2), "RedeemAsset", &["asset3", "10", "investor3"])
        .unwrap_err();
    assert_eq!(err.code(), "LockInActive");

    let err = host
        .call(t0() + Duration::days(6), "RedeemAsset", &["asset3", "10", "investor3"])
        .unwrap_err();
    assert_eq!(err.code(), "LockInActive");

    host.call(t0() + Duration::days(7), "RedeemAsset", &["asset3", "10", "investor3"])
        .unwrap();
    assert_eq!(host.investor("investor3").holding("asset3").unwrap().units, 20);
    assert_eq!(host.investor("investor3").balance, 1_000_000_000 - 200);
}

#[test]
fn fully_redeemed_holding_stays_in_portfolio() {
    let mut host = with_first_subscription();
    host.call(t0(), "RedeemAsset", &["A1", "20", "inv1"]).unwrap();

    let receipt_payload = {
        let invocation = Invocation::parse("GetPortfolio", &["inv1"]).unwrap();
        let mut tx = TxContext::new(&mut host.store, t0());
        invoke(&host.contract, &mut tx, &invocation).unwrap().unwrap()
    };
    let portfolio: assetledger_contracts::Portfolio = decode(&receipt_payload).unwrap();
    assert_eq!(portfolio["A1"].units, 0);
    assert_eq!(host.investor("inv1").balance, 1000);
}

#[test]
fn legacy_records_are_still_redeemable() {
    let mut host = Host::new();
    // Records as the previous host wrote them: null holdings on create and
    // Go-style timestamps on holdings.
    host.store
        .put_state(
            "inv1",
            br#"{"investor_id":"inv1","balance":500,"holdings":{"A1":{"isin":"A1","units":20,"subscribed_timestamp":"2024-02-01 09:30:00.123456789 +0000 UTC"}}}"#.to_vec(),
        )
        .unwrap();
    host.store
        .put_state(
            "A1",
            br#"{"isin":"A1","company_name":"c","asset_type":"bond","total_units":100,"price_per_unit":10,"available_units":80,"max_allowed_units":50,"min_redeem_units":5,"lock_in_period_days":7}"#.to_vec(),
        )
        .unwrap();

    host.call(t0(), "RedeemAsset", &["A1", "20", "inv1"]).unwrap();
    assert_eq!(host.investor("inv1").balance, 700);
    assert_eq!(host.asset("A1").available_units, 100);
}

#[test]
fn portfolio_of_long_unknown_id_is_not_found() {
    let mut host = Host::new();
    let id = "x".repeat(300);

    let err = host.call(t0(), "GetPortfolio", &[id.as_str()]).unwrap_err();
    assert_eq!(err.code(), "NotFound");

    host.call(t0(), "CreateUser", &[id.as_str(), "10"]).unwrap();
    assert_eq!(host.investor(&id).balance, 10);
}

#[test]
fn redeem_under_longest_lock_in_is_rejected() {
    let mut host = Host::new();
    host.call(t0(), "CreateUser", &["inv1", "1000"]).unwrap();
    host.call(
        t0(),
        "RegisterAsset",
        &["A1", "c", "bond", "100", "10", "50", "5", "4294967295"],
    )
    .unwrap();
    host.call(t0(), "SubscribeAsset", &["A1", "10", "inv1"]).unwrap();

    let err = host
        .call(t0() + Duration::days(1), "RedeemAsset", &["A1", "5", "inv1"])
        .unwrap_err();
    assert_eq!(err.code(), "LockInActive");
}

#[test]
fn rejected_call_releases_no_event() {
    let mut host = with_first_subscription();
    let invocation = Invocation::parse("RedeemAsset", &["A1", "3", "inv1"]).unwrap();
    let mut tx = TxContext::new(&mut host.store, t0());
    assert!(invoke(&host.contract, &mut tx, &invocation).is_err());
    assert!(tx.pending_event().is_none());
    assert_eq!(tx.pending_writes(), 0);
}
