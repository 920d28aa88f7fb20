//! # Exchange Engine
//!
//! The only component that moves quantity between nodes and value between
//! participants.
//!
//! ## Direct purchase
//!
//! ```text
//! validate ──→ take(seller node) ──→ create child ──→ credit seller ──→ append record
//! ```
//!
//! ## Request-based purchase
//!
//! ```text
//! create ──→ [Pending, escrow held] ──accept──→ re-validate ──ok──→ [Approved, seller credited]
//!                   │                               │
//!                   └──decline──→ [Rejected, refunded]
//!                                                   └──fails──→ [Rejected, refunded] + error
//! ```
//!
//! Quantity is not reserved while a request is pending. Two requests may be
//! created against quantity that only covers one; the second acceptance then
//! fails and refunds.
//!
//! Commands validate before they mutate, except where noted. Callers run
//! them inside a store transaction so that a failed command is discarded
//! as a whole.

use super::escrow::{BalanceBook, EscrowBook, Settlement};
use super::matching::{direct_acquisition, pack_acquisition, DirectAcquisition, PackAcquisition};
use super::purchase_log::{LogIntegrityError, PurchaseDraft, PurchaseLog};
use ap_01_identity_registry::RoleRegistry;
use ap_02_asset_graph::{can_discover, AssetGraph};
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Amount, BuyRequest, LedgerError, LedgerRef, NodeRef, PackId, PurchaseId,
    PurchaseRecord, Quantity, RejectionReason, RequestId, RequestRef, RequestStatus, Timestamp,
};
use std::collections::BTreeMap;

/// Outcome of a completed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: PurchaseId,
    pub node: NodeRef,
    /// Node created for the buyer; `None` for a consumption.
    pub child: Option<NodeRef>,
    pub total: Amount,
}

/// Outcome of resolving a buy request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Approved {
        receipt: PurchaseReceipt,
        granted_retailer: bool,
    },
    /// Seller declined; escrow refunded.
    Declined { settlement: Settlement },
    /// Seller accepted but the request could no longer be filled. The refund
    /// and rejection are committed and `error` is reported to the caller.
    Failed {
        settlement: Settlement,
        error: LedgerError,
    },
}

/// `quantity * price`, rejecting `supplied` unless it matches exactly.
pub fn required_payment(
    quantity: Quantity,
    price_per_unit: Amount,
    supplied: Amount,
) -> Result<Amount, LedgerError> {
    let required = Amount::from(quantity)
        .checked_mul(price_per_unit)
        .ok_or(LedgerError::PaymentMismatch {
            required: Amount::MAX,
            supplied,
        })?;
    if required != supplied {
        return Err(LedgerError::PaymentMismatch { required, supplied });
    }
    Ok(required)
}

/// Buy requests, value books and the purchase log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Exchange {
    requests: BTreeMap<RequestId, BuyRequest>,
    next_request: u64,
    escrow: EscrowBook,
    balances: BalanceBook,
    log: PurchaseLog,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // DIRECT PURCHASE
    // =========================================================================

    /// Buys `quantity` from an origin lot (distributors) or a retail unit
    /// (customers), paying exactly `quantity * price_per_unit`.
    ///
    /// # Errors
    /// - `NotFound` if the node does not exist
    /// - `Unauthorized` if the buyer owns the node or its role may not buy it
    /// - `NotAvailable` if the node is deactivated or empty
    /// - `VisibilityDenied` if the node is not discoverable by the buyer
    /// - `InvalidQuantity`, `InsufficientQuantity`
    /// - `PaymentMismatch` if `payment` is not the exact price
    #[allow(clippy::too_many_arguments)]
    pub fn buy_direct(
        &mut self,
        graph: &mut AssetGraph,
        registry: &RoleRegistry,
        buyer: Address,
        node: NodeRef,
        quantity: Quantity,
        payment: Amount,
        now: Timestamp,
    ) -> Result<PurchaseReceipt, LedgerError> {
        let seller_node = graph.summary(node)?;
        if seller_node.owner == buyer {
            return Err(LedgerError::unauthorized(buyer, format!("already owns {}", node)));
        }
        let buyer_role = registry.role_of(&buyer);
        let plan = direct_acquisition(buyer_role, node.kind()).ok_or_else(|| {
            LedgerError::unauthorized(
                buyer,
                format!("{} may not buy a {} directly", buyer_role, node.kind()),
            )
        })?;
        if !seller_node.stock.is_available() {
            return Err(LedgerError::NotAvailable(node));
        }
        if !can_discover(&buyer, &seller_node) {
            return Err(LedgerError::VisibilityDenied { node, caller: buyer });
        }
        seller_node.stock.ensure(node, quantity)?;
        let total = required_payment(quantity, seller_node.price_per_unit, payment)?;

        self.balances.record_supplied(total)?;
        graph.take(node, quantity)?;
        let purchase = self.log.next_id();
        let child = match (plan, node) {
            (DirectAcquisition::IntermediateLot, NodeRef::Origin(origin)) => {
                Some(NodeRef::Intermediate(graph.create_intermediate_lot(
                    origin,
                    buyer,
                    quantity,
                    seller_node.price_per_unit,
                    purchase,
                    now,
                )))
            }
            _ => None,
        };
        self.balances.credit(seller_node.owner, total);
        self.log.append(PurchaseDraft {
            node,
            child,
            seller: seller_node.owner,
            buyer,
            seller_role: registry.role_of(&seller_node.owner),
            buyer_role,
            quantity,
            price_per_unit: seller_node.price_per_unit,
            total,
            timestamp: now,
        });

        Ok(PurchaseReceipt {
            purchase,
            node,
            child,
            total,
        })
    }

    // =========================================================================
    // REQUEST-BASED PURCHASE
    // =========================================================================

    /// Escrows `payment` and opens a pending request for `quantity` of a pack.
    ///
    /// # Errors
    /// - `NotFound` if the pack does not exist
    /// - `Unauthorized` if the requester owns the pack, or the role and
    ///   `wants_retailer_role` combination is not allowed
    /// - `NotAvailable` if the pack is deactivated or empty
    /// - `VisibilityDenied` if the pack is not discoverable by the requester
    /// - `InvalidQuantity`, `InsufficientQuantity`, `PaymentMismatch`
    #[allow(clippy::too_many_arguments)]
    pub fn create_buy_request(
        &mut self,
        graph: &AssetGraph,
        registry: &RoleRegistry,
        requester: Address,
        pack: PackId,
        quantity: Quantity,
        wants_retailer_role: bool,
        payment: Amount,
        now: Timestamp,
    ) -> Result<RequestId, LedgerError> {
        let node = NodeRef::Pack(pack);
        let target = graph.summary(node)?;
        if target.owner == requester {
            return Err(LedgerError::unauthorized(requester, format!("already owns {}", node)));
        }
        let role = registry.role_of(&requester);
        if pack_acquisition(role, wants_retailer_role).is_none() {
            return Err(LedgerError::unauthorized(
                requester,
                format!("{} may not request a pack (wants retailer: {})", role, wants_retailer_role),
            ));
        }
        if !target.stock.is_available() {
            return Err(LedgerError::NotAvailable(node));
        }
        if !can_discover(&requester, &target) {
            return Err(LedgerError::VisibilityDenied {
                node,
                caller: requester,
            });
        }
        target.stock.ensure(node, quantity)?;
        let escrow_amount = required_payment(quantity, target.price_per_unit, payment)?;

        self.balances.record_supplied(escrow_amount)?;
        let id = RequestId(self.next_request + 1);
        self.escrow.hold(id, requester, escrow_amount)?;
        self.next_request += 1;
        self.requests.insert(
            id,
            BuyRequest {
                id,
                pack,
                requester,
                quantity,
                wants_retailer_role,
                escrow_amount,
                status: RequestStatus::Pending,
                rejection: None,
                created_at: now,
                resolved_at: None,
            },
        );
        Ok(id)
    }

    /// Accepts or declines a pending request. Only the pack owner may resolve.
    ///
    /// # Errors
    /// - `NoSuchRequest` if the request does not exist
    /// - `Unauthorized` if `caller` does not own the pack
    /// - `AlreadyResolved` if the request is no longer pending
    ///
    /// Failures discovered while filling an accepted request are returned as
    /// [`Resolution::Failed`] after the refund has been applied.
    pub fn resolve_buy_request(
        &mut self,
        graph: &mut AssetGraph,
        registry: &mut RoleRegistry,
        caller: Address,
        request_id: RequestId,
        accept: bool,
        now: Timestamp,
    ) -> Result<Resolution, LedgerError> {
        let request = self
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(LedgerError::NoSuchRequest(RequestRef::Buy(request_id)))?;
        let node = NodeRef::Pack(request.pack);
        let target = graph.summary(node)?;
        if target.owner != caller {
            return Err(LedgerError::unauthorized(caller, format!("does not own {}", node)));
        }
        if !request.is_pending() {
            return Err(LedgerError::AlreadyResolved(RequestRef::Buy(request_id)));
        }

        if !accept {
            let settlement = self.reject(request_id, RejectionReason::SellerDeclined, now)?;
            return Ok(Resolution::Declined { settlement });
        }

        // Re-validate against the pack and requester as they are now.
        let requester_role = registry.role_of(&request.requester);
        let plan = match pack_acquisition(requester_role, request.wants_retailer_role) {
            Some(plan) => plan,
            None => {
                let error = LedgerError::unauthorized(
                    request.requester,
                    format!("{} may no longer acquire {}", requester_role, node),
                );
                let settlement =
                    self.reject(request_id, RejectionReason::RequesterIneligible, now)?;
                return Ok(Resolution::Failed { settlement, error });
            }
        };
        if let Err(error) = target.stock.ensure(node, request.quantity) {
            let reason = match error {
                LedgerError::NotAvailable(_) => RejectionReason::NotAvailable,
                _ => RejectionReason::InsufficientQuantity,
            };
            let settlement = self.reject(request_id, reason, now)?;
            return Ok(Resolution::Failed { settlement, error });
        }

        graph.take(node, request.quantity)?;
        let purchase = self.log.next_id();
        let (child, granted_retailer) = match plan {
            PackAcquisition::RetailUnit { grants_retailer } => {
                if grants_retailer {
                    registry.grant_retailer(request.requester)?;
                }
                let unit = graph.create_unit_from_pack(
                    request.pack,
                    request.requester,
                    request.quantity,
                    purchase,
                    now,
                )?;
                (Some(NodeRef::Unit(unit)), grants_retailer)
            }
            PackAcquisition::Restock => {
                let pack = graph.create_pack_from_pack(
                    request.pack,
                    request.requester,
                    request.quantity,
                    purchase,
                    now,
                )?;
                (Some(NodeRef::Pack(pack)), false)
            }
            PackAcquisition::Consumption => (None, false),
        };

        let settlement = self.escrow.release_to_seller(request_id, target.owner)?;
        self.balances.settle(settlement);
        self.log.append(PurchaseDraft {
            node,
            child,
            seller: target.owner,
            buyer: request.requester,
            seller_role: registry.role_of(&target.owner),
            buyer_role: registry.role_of(&request.requester),
            quantity: request.quantity,
            price_per_unit: target.price_per_unit,
            total: request.escrow_amount,
            timestamp: now,
        });
        self.finish(request_id, RequestStatus::Approved, None, now);

        Ok(Resolution::Approved {
            receipt: PurchaseReceipt {
                purchase,
                node,
                child,
                total: request.escrow_amount,
            },
            granted_retailer,
        })
    }

    fn reject(
        &mut self,
        request_id: RequestId,
        reason: RejectionReason,
        now: Timestamp,
    ) -> Result<Settlement, LedgerError> {
        let settlement = self.escrow.refund(request_id)?;
        self.balances.settle(settlement);
        self.finish(request_id, RequestStatus::Rejected, Some(reason), now);
        Ok(settlement)
    }

    fn finish(
        &mut self,
        request_id: RequestId,
        status: RequestStatus,
        rejection: Option<RejectionReason>,
        now: Timestamp,
    ) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.status = status;
            request.rejection = rejection;
            request.resolved_at = Some(now);
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn request(&self, id: RequestId) -> Result<&BuyRequest, LedgerError> {
        self.requests
            .get(&id)
            .ok_or(LedgerError::NoSuchRequest(RequestRef::Buy(id)))
    }

    /// Pending requests against packs owned by `owner`.
    pub fn pending_requests_for(&self, graph: &AssetGraph, owner: &Address) -> Vec<&BuyRequest> {
        self.requests
            .values()
            .filter(|r| r.is_pending())
            .filter(|r| graph.pack(r.pack).map(|p| p.owner == *owner).unwrap_or(false))
            .collect()
    }

    /// Requests opened by `requester`, any status.
    pub fn requests_by(&self, requester: &Address) -> Vec<&BuyRequest> {
        self.requests
            .values()
            .filter(|r| r.requester == *requester)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.requests.values().filter(|r| r.is_pending()).count()
    }

    pub fn purchase(&self, id: PurchaseId) -> Result<&PurchaseRecord, LedgerError> {
        self.log
            .get(id)
            .ok_or(LedgerError::NotFound(LedgerRef::Purchase(id)))
    }

    /// Purchases where `participant` bought or sold, oldest first.
    pub fn purchase_history(&self, participant: &Address) -> Vec<&PurchaseRecord> {
        self.log.history_of(participant).collect()
    }

    /// Every purchase, oldest first.
    pub fn purchases(&self) -> impl Iterator<Item = &PurchaseRecord> + '_ {
        self.log.records()
    }

    pub fn purchase_count(&self) -> usize {
        self.log.len()
    }

    pub fn purchase_log(&self) -> &PurchaseLog {
        &self.log
    }

    pub fn verify_purchase_log(&self) -> Result<(), LogIntegrityError> {
        self.log.verify()
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.balance_of(address)
    }

    pub fn escrow_held(&self) -> Amount {
        self.escrow.total_held()
    }

    pub fn escrow(&self) -> &EscrowBook {
        &self.escrow
    }

    pub fn balances(&self) -> &BalanceBook {
        &self.balances
    }
}
