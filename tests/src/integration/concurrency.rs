//! # Concurrent Commands
//!
//! Commands from many threads must behave as if applied one at a time.

use crate::fixtures::*;
use ap_03_exchange::CHUNK_LEN;
use shared_types::{Address, LedgerError, NodeRef, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const THREADS: u8 = 8;

fn distributor(i: u8) -> Address {
    Address::repeat(0x40 + i)
}

fn retailer(i: u8) -> Address {
    Address::repeat(0x60 + i)
}

#[test]
fn test_competing_direct_purchases_never_oversell() {
    let net = Network::with_participants();
    for i in 0..THREADS {
        net.admit(distributor(i), Role::Distributor);
    }
    let lot = net.origin_lot(50, 2);

    let outcomes: Vec<Result<u64, LedgerError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let ledger = &net.ledger;
                scope.spawn(move || {
                    ledger
                        .buy_direct(distributor(i), NodeRef::Origin(lot), 9, 18)
                        .map(|_| 9)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("buyer thread panicked"))
            .collect()
    });

    let sold: u64 = outcomes.iter().filter_map(|o| o.as_ref().ok()).sum();
    assert_eq!(sold, 45);
    for outcome in &outcomes {
        if let Err(error) = outcome {
            assert!(
                matches!(
                    error,
                    LedgerError::InsufficientQuantity { .. } | LedgerError::NotAvailable(_)
                ),
                "unexpected failure: {}",
                error
            );
        }
    }
    let origin = net.ledger.node(NodeRef::Origin(lot)).unwrap();
    assert_eq!(origin.stock.remaining, 5);
    assert_eq!(net.ledger.balance_of(&FARMER), 90);
    assert!(net.ledger.snapshot().graph.conservation_violations().is_empty());
}

#[test]
fn test_competing_approvals_on_one_pack() {
    let net = Network::with_participants();
    for i in 0..THREADS {
        net.admit(retailer(i), Role::Retailer);
    }
    let lot = net.origin_lot(24, 1);
    let intermediate = net.buy_lot(DISTRIBUTOR, lot, 24);
    let pack = net.public_packs(DISTRIBUTOR, intermediate, &[24], 2)[0];
    let requests: Vec<_> = (0..THREADS)
        .map(|i| net.request(retailer(i), pack, 5, false))
        .collect();

    let approved: usize = thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| {
                let ledger = &net.ledger;
                let request = *request;
                scope.spawn(move || {
                    match ledger.resolve_buy_request(DISTRIBUTOR, request, true) {
                        Ok(_) => 1,
                        Err(LedgerError::InsufficientQuantity { .. }) => 0,
                        Err(other) => panic!("unexpected failure: {}", other),
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("resolver thread panicked"))
            .sum()
    });

    assert_eq!(approved, 4);
    assert_eq!(net.ledger.node(NodeRef::Pack(pack)).unwrap().stock.remaining, 4);
    assert_eq!(net.ledger.escrow_held(), 0);
    assert_eq!(net.ledger.balance_of(&DISTRIBUTOR), 40);
    let refunded: u128 = (0..THREADS).map(|i| net.ledger.balance_of(&retailer(i))).sum();
    assert_eq!(refunded, 4 * 10);
}

#[test]
fn test_readers_see_consistent_snapshots_during_writes() {
    let net = Network::with_participants();
    let lot = net.origin_lot(1_000, 1);
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let ledger = &net.ledger;
        let done = &done;
        let reader = scope.spawn(move || {
            let mut last_version = 0;
            let mut reads = 0u64;
            while !done.load(Ordering::Acquire) {
                let state = ledger.snapshot();
                assert!(state.version >= last_version);
                last_version = state.version;

                let balances = state.exchange.balances();
                assert_eq!(
                    balances.total_supplied(),
                    balances.total_credited() + state.exchange.escrow_held()
                );
                let origin = state.graph.summary(NodeRef::Origin(lot)).unwrap();
                let sold: u64 = state.exchange.purchases().map(|p| p.quantity).sum();
                assert_eq!(origin.stock.remaining + sold, 1_000);
                reads += 1;
            }
            reads
        });

        for _ in 0..100 {
            for buyer in [DISTRIBUTOR, DISTRIBUTOR_2] {
                ledger
                    .buy_direct(buyer, NodeRef::Origin(lot), 3, 3)
                    .expect("stock is ample");
            }
        }
        done.store(true, Ordering::Release);
        let reads = reader.join().expect("reader thread panicked");
        assert!(reads > 0);
    });

    assert_eq!(net.ledger.stats().purchases, 200);
    assert!(net.ledger.verify_purchase_log().is_ok());
}

#[test]
fn test_concurrent_versions_are_distinct() {
    let net = Network::with_participants();
    let lot = net.origin_lot(400, 1);

    let mut versions: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = [DISTRIBUTOR, DISTRIBUTOR_2]
            .into_iter()
            .map(|buyer| {
                let ledger = &net.ledger;
                scope.spawn(move || {
                    (0..50)
                        .map(|_| {
                            ledger
                                .buy_direct(buyer, NodeRef::Origin(lot), 2, 2)
                                .expect("stock is ample")
                                .version()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("buyer thread panicked"))
            .collect()
    });

    versions.sort_unstable();
    versions.dedup();
    assert_eq!(versions.len(), 100);
}

// =============================================================================
// SNAPSHOT SHARING
// =============================================================================

#[test]
fn test_commits_share_sealed_purchase_history() {
    let net = Network::with_participants();
    let lot = net.origin_lot(1_000, 1);
    for _ in 0..CHUNK_LEN {
        net.buy_lot(DISTRIBUTOR, lot, 1);
    }
    let before = net.ledger.snapshot();

    net.buy_lot(DISTRIBUTOR_2, lot, 1);
    let after = net.ledger.snapshot();

    let old_chunks = before.exchange.purchase_log().sealed_chunks();
    let new_chunks = after.exchange.purchase_log().sealed_chunks();
    assert_eq!(old_chunks.len(), 1);
    assert!(Arc::ptr_eq(&old_chunks[0], &new_chunks[0]));
    assert_eq!(before.exchange.purchase_count(), CHUNK_LEN);
    assert_eq!(after.exchange.purchase_count(), CHUNK_LEN + 1);
    assert!(net.ledger.verify_purchase_log().is_ok());
}
