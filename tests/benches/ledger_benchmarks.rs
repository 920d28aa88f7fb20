//! # Provenance Ledger Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | ap-02 Asset Graph | Split into N children | Linear in N |
//! | ap-04 Traceability | Trace over K restocks | Linear in K |
//! | Runtime | Snapshot read | Constant, never blocks on writers |
//! | ap-03 Exchange | Direct purchase commit | Dominated by state clone |

#![allow(clippy::excessive_nesting)]

use ap_tests::fixtures::{split_request, Network, DISTRIBUTOR, DISTRIBUTOR_2, RETAILER};
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::Rng;
use shared_types::{Listing, NodeRef, PackId};
use std::time::Duration;

// ============================================================================
// AP-02: Split
// ============================================================================

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("ap-02-split");
    group.measurement_time(Duration::from_secs(5));

    for children in [1usize, 8, 64] {
        let quantities = vec![1u64; children];
        let request = split_request(&quantities, 2);
        group.throughput(Throughput::Elements(children as u64));
        group.bench_with_input(
            BenchmarkId::new("split_intermediate", children),
            &request,
            |b, request| {
                b.iter_batched(
                    || {
                        let net = Network::with_participants();
                        let lot = net.origin_lot(1_000, 1);
                        let intermediate = net.buy_lot(DISTRIBUTOR, lot, 1_000);
                        (net, intermediate)
                    },
                    |(net, intermediate)| {
                        black_box(net.ledger.split(
                            DISTRIBUTOR,
                            NodeRef::Intermediate(intermediate),
                            request,
                        ))
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

// ============================================================================
// AP-04: Trace depth
// ============================================================================

fn restocked(net: &Network, hops: usize) -> PackId {
    let lot = net.origin_lot(100_000, 1);
    let intermediate = net.buy_lot(DISTRIBUTOR, lot, 100_000);
    let mut pack = net.public_packs(DISTRIBUTOR, intermediate, &[100_000], 1)[0];
    let mut owner = DISTRIBUTOR;
    for hop in 0..hops {
        let buyer = if owner == DISTRIBUTOR { DISTRIBUTOR_2 } else { DISTRIBUTOR };
        let request = net.request(buyer, pack, 90_000 - hop as u64, false);
        let resolution = net
            .ledger
            .resolve_buy_request(owner, request, true)
            .expect("restock")
            .into_value();
        pack = match resolution {
            ap_03_exchange::Resolution::Approved { receipt, .. } => match receipt.child {
                Some(NodeRef::Pack(next)) => next,
                other => panic!("expected a pack, got {:?}", other),
            },
            other => panic!("expected approval, got {:?}", other),
        };
        net.ledger
            .list_pack(buyer, pack, Listing::Public)
            .expect("list");
        owner = buyer;
    }
    pack
}

fn bench_trace_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("ap-04-trace");

    for hops in [1usize, 16, 128] {
        let net = Network::with_participants();
        let pack = restocked(&net, hops);
        group.throughput(Throughput::Elements(hops as u64));
        group.bench_with_input(BenchmarkId::new("trace_restock_chain", hops), &pack, |b, pack| {
            b.iter(|| {
                let trace = net.ledger.trace(NodeRef::Pack(*pack)).expect("trace");
                black_box(trace.entries().len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// RUNTIME: Snapshot reads and commits
// ============================================================================

fn bench_snapshot_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("runtime-snapshot");
    let net = Network::with_participants();
    let lot = net.origin_lot(1_000_000, 1);
    for _ in 0..200 {
        net.buy_lot(DISTRIBUTOR, lot, 10);
    }

    group.bench_function("snapshot_stats", |b| {
        b.iter(|| black_box(net.ledger.stats()))
    });
    group.bench_function("inventory_of", |b| {
        b.iter(|| black_box(net.ledger.inventory_of(&DISTRIBUTOR).intermediate_lots.len()))
    });

    group.finish();
}

fn bench_direct_purchase(c: &mut Criterion) {
    let mut group = c.benchmark_group("ap-03-exchange");
    let net = Network::with_participants();
    let lot = net.origin_lot(1_000_000, 1);
    let mut rng = rand::thread_rng();

    group.bench_function("buy_direct_commit", |b| {
        b.iter_batched(
            || {
                let net = Network::with_participants();
                let lot = net.origin_lot(1_000, 1);
                (net, lot, rng.gen_range(1..10u64))
            },
            |(net, lot, quantity)| {
                black_box(net.ledger.buy_direct(
                    DISTRIBUTOR,
                    NodeRef::Origin(lot),
                    quantity,
                    u128::from(quantity),
                ))
            },
            BatchSize::SmallInput,
        )
    });

    let packs = net.public_packs(DISTRIBUTOR, net.buy_lot(DISTRIBUTOR, lot, 10), &[10], 1);
    net.ledger
        .list_pack(DISTRIBUTOR, packs[0], Listing::Unlisted)
        .expect("unlist");
    group.bench_function("create_request_rejected_visibility", |b| {
        b.iter(|| black_box(net.ledger.create_buy_request(RETAILER, packs[0], 1, false, 1)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_split,
    bench_trace_depth,
    bench_snapshot_reads,
    bench_direct_purchase
);
criterion_main!(benches);
