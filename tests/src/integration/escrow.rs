//! # Escrow Settlement
//!
//! Every escrowed payment reaches exactly one destination.

use crate::fixtures::*;
use ap_03_exchange::{Resolution, Settlement};
use shared_types::{LedgerError, NodeRef, PackId, RequestRef, RequestStatus};

fn market(net: &Network, quantities: &[u64]) -> Vec<PackId> {
    let total = quantities.iter().sum();
    let lot = net.origin_lot(total, 2);
    let intermediate = net.buy_lot(DISTRIBUTOR, lot, total);
    net.public_packs(DISTRIBUTOR, intermediate, quantities, 3)
}

#[test]
fn test_second_resolve_is_already_resolved() {
    let net = Network::with_participants();
    let packs = market(&net, &[20]);
    let request = net.request(RETAILER, packs[0], 5, false);

    net.ledger
        .resolve_buy_request(DISTRIBUTOR, request, true)
        .unwrap();
    let balance = net.ledger.balance_of(&DISTRIBUTOR);

    for accept in [true, false] {
        let again = net.ledger.resolve_buy_request(DISTRIBUTOR, request, accept);
        assert_eq!(
            again.unwrap_err(),
            LedgerError::AlreadyResolved(RequestRef::Buy(request))
        );
    }
    assert_eq!(net.ledger.balance_of(&DISTRIBUTOR), balance);
    assert_eq!(net.ledger.balance_of(&RETAILER), 0);
}

#[test]
fn test_declined_request_refunds_once() {
    let net = Network::with_participants();
    let packs = market(&net, &[20]);
    let request = net.request(RETAILER, packs[0], 4, false);
    assert_eq!(net.ledger.escrow_held(), 12);

    let resolution = net
        .ledger
        .resolve_buy_request(DISTRIBUTOR, request, false)
        .unwrap()
        .into_value();

    assert_eq!(
        resolution,
        Resolution::Declined {
            settlement: Settlement::RefundedToPayer {
                payer: RETAILER,
                amount: 12
            }
        }
    );
    assert_eq!(net.ledger.balance_of(&RETAILER), 12);
    assert_eq!(net.ledger.escrow_held(), 0);
    assert!(matches!(
        net.ledger.resolve_buy_request(DISTRIBUTOR, request, false),
        Err(LedgerError::AlreadyResolved(_))
    ));
    assert_eq!(net.ledger.balance_of(&RETAILER), 12);
}

#[test]
fn test_competing_requests_settle_independently() {
    let net = Network::with_participants();
    let packs = market(&net, &[10]);
    let first = net.request(RETAILER, packs[0], 8, false);
    let second = net.request(RETAILER_2, packs[0], 8, false);
    assert_eq!(net.ledger.escrow_held(), 48);

    net.ledger
        .resolve_buy_request(DISTRIBUTOR, first, true)
        .unwrap();
    let failed = net.ledger.resolve_buy_request(DISTRIBUTOR, second, true);

    assert!(matches!(
        failed,
        Err(LedgerError::InsufficientQuantity {
            requested: 8,
            remaining: 2,
            ..
        })
    ));
    assert_eq!(net.ledger.balance_of(&RETAILER_2), 24);
    assert_eq!(
        net.ledger.buy_request(second).unwrap().status,
        RequestStatus::Rejected
    );
    assert_eq!(
        net.ledger.node(NodeRef::Pack(packs[0])).unwrap().stock.remaining,
        2
    );

    let state = net.ledger.snapshot();
    let escrow = state.exchange.escrow();
    assert!(matches!(
        escrow.settlement_of(first),
        Some(Settlement::CreditedToSeller { amount: 24, .. })
    ));
    assert!(matches!(
        escrow.settlement_of(second),
        Some(Settlement::RefundedToPayer { amount: 24, .. })
    ));
    assert_eq!(escrow.total_held(), 0);
}

#[test]
fn test_only_pack_owner_resolves() {
    let net = Network::with_participants();
    let packs = market(&net, &[10]);
    let request = net.request(RETAILER, packs[0], 2, false);

    for intruder in [DISTRIBUTOR_2, RETAILER, ADMIN] {
        assert!(matches!(
            net.ledger.resolve_buy_request(intruder, request, true),
            Err(LedgerError::Unauthorized { .. })
        ));
    }
    assert!(net.ledger.buy_request(request).unwrap().is_pending());
    assert_eq!(net.ledger.escrow_held(), 6);
}

#[test]
fn test_unknown_request() {
    let net = Network::with_participants();
    let missing = shared_types::RequestId(404);

    assert_eq!(
        net.ledger
            .resolve_buy_request(DISTRIBUTOR, missing, true)
            .unwrap_err(),
        LedgerError::NoSuchRequest(RequestRef::Buy(missing))
    );
}

#[test]
fn test_many_requests_total_conserved() {
    let net = Network::with_participants();
    let packs = market(&net, &[30, 30]);
    let mut requests = Vec::new();
    for (i, pack) in packs.iter().cycle().take(10).enumerate() {
        let requester = if i % 2 == 0 { RETAILER } else { CUSTOMER };
        requests.push(net.request(requester, *pack, 4, false));
    }
    assert_eq!(net.ledger.escrow_held(), 10 * 12);

    for (i, request) in requests.iter().enumerate() {
        let _ = net
            .ledger
            .resolve_buy_request(DISTRIBUTOR, *request, i % 3 != 0);
    }

    let state = net.ledger.snapshot();
    let balances = state.exchange.balances();
    assert_eq!(net.ledger.escrow_held(), 0);
    assert_eq!(balances.total_supplied(), balances.total_credited());
    let paid_out = net.ledger.balance_of(&FARMER)
        + net.ledger.balance_of(&DISTRIBUTOR)
        + net.ledger.balance_of(&RETAILER)
        + net.ledger.balance_of(&CUSTOMER);
    assert_eq!(paid_out, balances.total_credited());
}
