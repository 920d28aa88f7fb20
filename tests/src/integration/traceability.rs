//! # Custody Chain Reconstruction
//!
//! Traces must list one entry per purchase edge, origin first, and agree
//! with the purchase log.

use crate::fixtures::*;
use ap_03_exchange::{PurchaseReceipt, Resolution};
use shared_types::{
    Address, LedgerError, LedgerRef, Listing, NodeRef, PackId, PurchaseId, RetailUnitId, Role,
    TraceEntry,
};

/// Restocks a pack `hops` times, alternating between the two distributors.
/// Returns the last pack.
fn restock_chain(net: &Network, hops: usize) -> PackId {
    let lot = net.origin_lot(1_000, 1);
    let intermediate = net.buy_lot(DISTRIBUTOR, lot, 500);
    let mut pack = net.public_packs(DISTRIBUTOR, intermediate, &[500], 2)[0];
    let mut owner = DISTRIBUTOR;

    for hop in 0..hops {
        let buyer = if owner == DISTRIBUTOR { DISTRIBUTOR_2 } else { DISTRIBUTOR };
        let quantity = 400 - 10 * hop as u64;
        let request = net.request(buyer, pack, quantity, false);
        let resolution = net
            .ledger
            .resolve_buy_request(owner, request, true)
            .expect("restock")
            .into_value();
        pack = match resolution {
            Resolution::Approved {
                receipt:
                    PurchaseReceipt {
                        child: Some(NodeRef::Pack(next)),
                        ..
                    },
                ..
            } => next,
            other => panic!("expected a restocked pack, got {:?}", other),
        };
        net.ledger
            .list_pack(buyer, pack, Listing::Public)
            .expect("list restocked pack");
        owner = buyer;
    }
    pack
}

fn retail_unit_from(net: &Network, pack: PackId, retailer: Address) -> RetailUnitId {
    let owner = net.ledger.node(NodeRef::Pack(pack)).expect("pack").owner;
    let request = net.request(retailer, pack, 20, false);
    match net
        .ledger
        .resolve_buy_request(owner, request, true)
        .expect("retail purchase")
        .into_value()
    {
        Resolution::Approved { receipt, .. } => match receipt.child {
            Some(NodeRef::Unit(unit)) => unit,
            other => panic!("expected a retail unit, got {:?}", other),
        },
        other => panic!("expected approval, got {:?}", other),
    }
}

fn assert_matches_log(net: &Network, entries: &[TraceEntry]) {
    for entry in entries {
        let record = net.ledger.purchase(entry.purchase_id).expect("logged purchase");
        assert_eq!(entry.node, record.node);
        assert_eq!(entry.seller, record.seller);
        assert_eq!(entry.buyer, record.buyer);
        assert_eq!(entry.quantity, record.quantity);
        assert_eq!(entry.price_per_unit, record.price_per_unit);
    }
    for pair in entries.windows(2) {
        assert_eq!(pair[0].buyer, pair[1].seller, "custody gap in trace");
        assert!(pair[0].purchase_id < pair[1].purchase_id);
    }
}

// =============================================================================
// CHAIN LENGTH
// =============================================================================

#[test]
fn test_restock_chain_entry_count() {
    for hops in [0, 1, 3, 8] {
        let net = Network::with_participants();
        let pack = restock_chain(&net, hops);
        let unit = retail_unit_from(&net, pack, RETAILER);

        let entries = net.ledger.trace(NodeRef::Unit(unit)).unwrap().entries();

        assert_eq!(entries.len(), hops + 2, "hops = {}", hops);
        assert_eq!(entries[0].seller, FARMER);
        assert_eq!(entries[0].seller_role, Role::Farmer);
        assert_eq!(entries[hops + 1].buyer, RETAILER);
        assert_matches_log(&net, &entries);
    }
}

#[test]
fn test_splits_add_no_entries() {
    let net = Network::with_participants();
    let pack = restock_chain(&net, 2);
    let unit = retail_unit_from(&net, pack, RETAILER);
    let before = net.ledger.trace(NodeRef::Unit(unit)).unwrap().entries();

    let pieces = net.split(RETAILER, NodeRef::Unit(unit), &[5, 5], 3);
    let nested = net.split(RETAILER, pieces[0], &[2, 2], 4);

    let after = net.ledger.trace(nested[1]).unwrap().entries();
    assert_eq!(after, before);
}

#[test]
fn test_customer_purchase_trace_ends_with_purchase() {
    let net = Network::with_participants();
    let pack = restock_chain(&net, 1);
    let unit = retail_unit_from(&net, pack, RETAILER);
    net.ledger
        .list_unit(RETAILER, unit, Listing::Public)
        .unwrap();
    let price = net.ledger.node(NodeRef::Unit(unit)).unwrap().price_per_unit;
    let receipt = net
        .ledger
        .buy_direct(CUSTOMER, NodeRef::Unit(unit), 3, 3 * price)
        .unwrap()
        .into_value();

    let trace = net.ledger.purchase_trace(receipt.purchase).unwrap();
    let entries = trace.entries();

    assert_eq!(trace.leaf(), NodeRef::Unit(unit));
    assert_eq!(entries.len(), 4);
    let last = entries.last().unwrap();
    assert_eq!(last.purchase_id, receipt.purchase);
    assert_eq!(last.buyer, CUSTOMER);
    assert_eq!(last.buyer_role, Role::Customer);
    assert_eq!(last.seller, RETAILER);
    assert_matches_log(&net, &entries);
}

// =============================================================================
// SNAPSHOT SEMANTICS & EDGE CASES
// =============================================================================

#[test]
fn test_trace_pins_its_snapshot() {
    let net = Network::with_participants();
    let lot = net.origin_lot(100, 1);
    let intermediate = net.buy_lot(DISTRIBUTOR, lot, 50);
    let trace = net.ledger.trace(NodeRef::Intermediate(intermediate)).unwrap();

    // Later commits do not alter an existing trace.
    net.buy_lot(DISTRIBUTOR_2, lot, 25);
    net.public_packs(DISTRIBUTOR, intermediate, &[10], 2);

    let entries = trace.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries, trace.iter().collect::<Vec<_>>());
    assert_eq!(entries[0].buyer, DISTRIBUTOR);
}

#[test]
fn test_origin_lot_has_empty_trace() {
    let net = Network::with_participants();
    let lot = net.origin_lot(10, 1);

    assert!(net
        .ledger
        .trace(NodeRef::Origin(lot))
        .unwrap()
        .entries()
        .is_empty());
}

#[test]
fn test_unknown_targets() {
    let net = Network::with_participants();
    let ghost = NodeRef::Pack(PackId(77));
    let missing = PurchaseId(77);

    assert_eq!(
        net.ledger.trace(ghost).unwrap_err(),
        LedgerError::NotFound(LedgerRef::Node(ghost))
    );
    assert_eq!(
        net.ledger.purchase_trace(missing).unwrap_err(),
        LedgerError::NotFound(LedgerRef::Purchase(missing))
    );
}
