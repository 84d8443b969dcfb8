// Contract benchmarks for the asset ledger.
//
// Covers a single subscription, a subscription followed by a redemption,
// and portfolio reads as the number of holdings grows. Everything runs
// against the in-memory store so the numbers reflect contract logic and
// record encoding, not disk I/O.

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use assetledger_contracts::AssetManagementContract;
use assetledger_protocol::{MemoryStore, TxContext};

/// One investor with a deep balance and `assets` registered assets.
fn setup_ledger(assets: usize) -> (AssetManagementContract, MemoryStore) {
    let contract = AssetManagementContract::new();
    let mut store = MemoryStore::new();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

    let mut tx = TxContext::new(&mut store, at);
    contract.create_investor(&mut tx, "inv1", u64::MAX / 2).unwrap();
    for i in 0..assets {
        contract
            .register_asset(&mut tx, &format!("ISIN{i:06}"), "company", "bond", 1_000_000, 10, 1_000, 1, 0)
            .unwrap();
    }
    tx.commit().unwrap();

    (contract, store)
}

fn bench_subscribe(c: &mut Criterion) {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

    c.bench_function("ledger/subscribe", |b| {
        b.iter_batched(
            || setup_ledger(1),
            |(contract, mut store)| {
                let mut tx = TxContext::new(&mut store, at);
                contract.subscribe(&mut tx, "ISIN000000", 10, "inv1").unwrap();
                tx.commit().unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_subscribe_then_redeem(c: &mut Criterion) {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

    c.bench_function("ledger/subscribe_redeem", |b| {
        b.iter_batched(
            || setup_ledger(1),
            |(contract, mut store)| {
                let mut tx = TxContext::new(&mut store, at);
                contract.subscribe(&mut tx, "ISIN000000", 10, "inv1").unwrap();
                tx.commit().unwrap();

                let mut tx = TxContext::new(&mut store, at);
                contract.redeem(&mut tx, "ISIN000000", 10, "inv1").unwrap();
                tx.commit().unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_portfolio(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/portfolio");
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

    for holdings in [1usize, 10, 100] {
        let (contract, mut store) = setup_ledger(holdings);
        let mut tx = TxContext::new(&mut store, at);
        for i in 0..holdings {
            contract.subscribe(&mut tx, &format!("ISIN{i:06}"), 1, "inv1").unwrap();
        }
        tx.commit().unwrap();

        group.throughput(Throughput::Elements(holdings as u64));
        group.bench_with_input(BenchmarkId::from_parameter(holdings), &holdings, |b, _| {
            b.iter(|| {
                let tx = TxContext::new(&mut store, at);
                contract.get_portfolio(&tx, "inv1").unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_subscribe, bench_subscribe_then_redeem, bench_portfolio);
criterion_main!(benches);
