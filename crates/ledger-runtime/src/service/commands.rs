//! State-changing operations.

use super::{Committed, ProvenanceLedger};
use crate::events::LedgerEvent;
use crate::ports::{EventPublisher, LedgerStore, TimeSource};
use crate::state::LedgerState;
use ap_02_asset_graph::SplitRequest;
use ap_03_exchange::{PurchaseReceipt, Resolution, Settlement};
use ledger_telemetry::{log_event, log_node_event, log_request_event};
use shared_types::{
    Address, Amount, LedgerError, Listing, NodeRef, OriginAttributes, OriginLotId, PackId,
    Participant, Quantity, RequestId, RetailUnitId, Role, Visibility,
};
use tracing::{field, instrument};

fn settled_amount(settlement: &Settlement) -> Amount {
    match settlement {
        Settlement::CreditedToSeller { amount, .. } | Settlement::RefundedToPayer { amount, .. } => {
            *amount
        }
    }
}

fn purchase_completed(receipt: &PurchaseReceipt) -> LedgerEvent {
    LedgerEvent::PurchaseCompleted {
        purchase: receipt.purchase,
        node: receipt.node,
        child: receipt.child,
        total: receipt.total,
    }
}

fn resolution_events(
    state: &LedgerState,
    request: RequestId,
    resolution: &Resolution,
) -> Vec<LedgerEvent> {
    match resolution {
        Resolution::Approved {
            receipt,
            granted_retailer,
        } => {
            let mut events = Vec::with_capacity(3);
            if *granted_retailer {
                if let Ok(filled) = state.exchange.request(request) {
                    events.push(LedgerEvent::RetailerGranted {
                        participant: filled.requester,
                    });
                }
            }
            events.push(purchase_completed(receipt));
            events.push(LedgerEvent::BuyRequestApproved {
                request,
                purchase: receipt.purchase,
            });
            events
        }
        Resolution::Declined { settlement } | Resolution::Failed { settlement, .. } => {
            vec![LedgerEvent::BuyRequestRejected {
                request,
                reason: state
                    .exchange
                    .request(request)
                    .ok()
                    .and_then(|r| r.rejection),
                refunded: settled_amount(settlement),
            }]
        }
    }
}

impl<S, P, T> ProvenanceLedger<S, P, T>
where
    S: LedgerStore,
    P: EventPublisher,
    T: TimeSource,
{
    // =========================================================================
    // IDENTITY & ROLES
    // =========================================================================

    /// Files (or refiles) an admission request for Farmer, Distributor or
    /// Retailer.
    #[instrument(
        skip_all,
        fields(requester = %requester, role = %role, correlation_id = field::Empty)
    )]
    pub fn request_role(
        &self,
        requester: Address,
        role: Role,
        id_hash: Option<String>,
        meta: Option<String>,
    ) -> Result<Committed<Participant>, LedgerError> {
        self.commit("request_role", |state, now| {
            let participant = state
                .registry
                .request_role(requester, role, id_hash, meta, now)?
                .clone();
            Ok((
                participant,
                vec![LedgerEvent::RoleRequested {
                    participant: requester,
                    role,
                }],
            ))
        })
    }

    /// Admin grants `role` to a pending requester.
    #[instrument(
        skip_all,
        fields(caller = %caller, requester = %requester, role = %role, correlation_id = field::Empty)
    )]
    pub fn approve_role(
        &self,
        caller: Address,
        requester: Address,
        role: Role,
    ) -> Result<Committed<Participant>, LedgerError> {
        self.commit("approve_role", |state, _| {
            let participant = state.registry.approve_role(caller, requester, role)?.clone();
            Ok((
                participant,
                vec![LedgerEvent::RoleApproved {
                    participant: requester,
                    role,
                }],
            ))
        })
    }

    /// Self-service Customer role.
    #[instrument(skip_all, fields(requester = %requester, correlation_id = field::Empty))]
    pub fn assign_customer(&self, requester: Address) -> Result<Committed<Participant>, LedgerError> {
        self.commit("assign_customer", |state, _| {
            let participant = state.registry.assign_customer(requester)?.clone();
            Ok((
                participant,
                vec![LedgerEvent::CustomerAssigned {
                    participant: requester,
                }],
            ))
        })
    }

    // =========================================================================
    // ASSET GRAPH
    // =========================================================================

    /// Registers a new origin lot owned by `farmer`.
    #[instrument(
        skip_all,
        fields(farmer = %farmer, quantity = quantity, correlation_id = field::Empty)
    )]
    pub fn add_origin_lot(
        &self,
        farmer: Address,
        attributes: OriginAttributes,
        quantity: Quantity,
        price_per_unit: Amount,
        visibility: Visibility,
    ) -> Result<Committed<OriginLotId>, LedgerError> {
        self.commit("add_origin_lot", |state, now| {
            let role = state.registry.role_of(&farmer);
            let lot = state.graph.add_origin_lot(
                farmer,
                role,
                attributes,
                quantity,
                price_per_unit,
                visibility,
                now,
            )?;
            Ok((
                lot,
                vec![LedgerEvent::OriginLotAdded {
                    lot,
                    farmer,
                    quantity,
                }],
            ))
        })
    }

    /// Partitions part of a node's remaining quantity into new children.
    #[instrument(
        skip_all,
        fields(caller = %caller, parent = %parent, children = request.len(), correlation_id = field::Empty)
    )]
    pub fn split(
        &self,
        caller: Address,
        parent: NodeRef,
        request: &SplitRequest,
    ) -> Result<Committed<Vec<NodeRef>>, LedgerError> {
        let committed = self.commit("split", |state, now| {
            let role = state.registry.role_of(&caller);
            let children = state.graph.split(caller, role, parent, request, now)?;
            let events = vec![LedgerEvent::NodeSplit {
                parent,
                children: children.clone(),
            }];
            Ok((children, events))
        })?;
        log_node_event!(
            debug,
            "asset_graph",
            "node split",
            parent,
            children = committed.value.len()
        );
        Ok(committed)
    }

    #[instrument(skip_all, fields(caller = %caller, pack = %pack, correlation_id = field::Empty))]
    pub fn list_pack(
        &self,
        caller: Address,
        pack: PackId,
        listing: Listing,
    ) -> Result<Committed<()>, LedgerError> {
        self.commit("list_pack", |state, _| {
            state.graph.list_pack(caller, pack, listing)?;
            Ok((
                (),
                vec![LedgerEvent::ListingChanged {
                    node: NodeRef::Pack(pack),
                    listing,
                }],
            ))
        })
    }

    /// Lists a retail unit for customers.
    #[instrument(skip_all, fields(caller = %caller, unit = %unit, correlation_id = field::Empty))]
    pub fn list_unit(
        &self,
        caller: Address,
        unit: RetailUnitId,
        listing: Listing,
    ) -> Result<Committed<()>, LedgerError> {
        self.commit("list_unit", |state, _| {
            state.graph.list_unit(caller, unit, listing)?;
            Ok((
                (),
                vec![LedgerEvent::ListingChanged {
                    node: NodeRef::Unit(unit),
                    listing,
                }],
            ))
        })
    }

    /// Owner-initiated, terminal deactivation.
    #[instrument(skip_all, fields(caller = %caller, node = %node, correlation_id = field::Empty))]
    pub fn deactivate(&self, caller: Address, node: NodeRef) -> Result<Committed<()>, LedgerError> {
        self.commit("deactivate", |state, _| {
            state.graph.deactivate(caller, node)?;
            Ok(((), vec![LedgerEvent::NodeDeactivated { node }]))
        })
    }

    // =========================================================================
    // EXCHANGE
    // =========================================================================

    /// Buys from an origin lot (distributors) or a listed retail unit
    /// (customers), paying exactly `quantity * price_per_unit`.
    #[instrument(
        skip_all,
        fields(buyer = %buyer, node = %node, quantity = quantity, payment = payment, correlation_id = field::Empty)
    )]
    pub fn buy_direct(
        &self,
        buyer: Address,
        node: NodeRef,
        quantity: Quantity,
        payment: Amount,
    ) -> Result<Committed<PurchaseReceipt>, LedgerError> {
        self.commit("buy_direct", |state, now| {
            let receipt = state.exchange.buy_direct(
                &mut state.graph,
                &state.registry,
                buyer,
                node,
                quantity,
                payment,
                now,
            )?;
            let event = purchase_completed(&receipt);
            Ok((receipt, vec![event]))
        })
    }

    /// Files a request to buy from a pack, holding `payment` in escrow.
    #[instrument(
        skip_all,
        fields(requester = %requester, pack = %pack, quantity = quantity, correlation_id = field::Empty)
    )]
    pub fn create_buy_request(
        &self,
        requester: Address,
        pack: PackId,
        quantity: Quantity,
        wants_retailer_role: bool,
        payment: Amount,
    ) -> Result<Committed<RequestId>, LedgerError> {
        self.commit("create_buy_request", |state, now| {
            let request = state.exchange.create_buy_request(
                &state.graph,
                &state.registry,
                requester,
                pack,
                quantity,
                wants_retailer_role,
                payment,
                now,
            )?;
            let escrow = state
                .exchange
                .request(request)
                .map(|r| r.escrow_amount)
                .unwrap_or(payment);
            Ok((
                request,
                vec![LedgerEvent::BuyRequestCreated {
                    request,
                    pack,
                    requester,
                    escrow,
                }],
            ))
        })
    }

    /// Accepts or declines a pending buy request.
    ///
    /// An accepted request that can no longer be filled is refunded and
    /// marked Rejected; that change is committed and its cause is returned
    /// as the error.
    #[instrument(
        skip_all,
        fields(caller = %caller, request = %request, accept = accept, correlation_id = field::Empty)
    )]
    pub fn resolve_buy_request(
        &self,
        caller: Address,
        request: RequestId,
        accept: bool,
    ) -> Result<Committed<Resolution>, LedgerError> {
        let committed = self.commit("resolve_buy_request", |state, now| {
            let resolution = state.exchange.resolve_buy_request(
                &mut state.graph,
                &mut state.registry,
                caller,
                request,
                accept,
                now,
            )?;
            let events = resolution_events(state, request, &resolution);
            Ok((resolution, events))
        })?;

        if let Resolution::Failed { error, settlement } = &committed.value {
            log_request_event!(
                warn,
                "exchange",
                "accepted request could not be filled; escrow refunded",
                request,
                refunded = settled_amount(settlement),
                error = %error
            );
            return Err(error.clone());
        }
        log_event!(
            debug,
            "exchange",
            "buy request resolved",
            request = %request,
            accepted = accept
        );
        Ok(committed)
    }
}
