//! Events emitted by committed commands.
//!
//! Events are published after the commit they describe, never for a
//! rejected command. The one exception to "error means nothing happened"
//! is an accepted buy request that can no longer be filled: its refund is
//! committed and announced as `BuyRequestRejected` before the error is
//! returned.

use serde::Serialize;
use shared_types::{
    Address, Amount, Listing, NodeRef, OriginLotId, PackId, PurchaseId, Quantity,
    RejectionReason, RequestId, Role,
};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    RoleRequested {
        participant: Address,
        role: Role,
    },
    RoleApproved {
        participant: Address,
        role: Role,
    },
    CustomerAssigned {
        participant: Address,
    },
    RetailerGranted {
        participant: Address,
    },
    OriginLotAdded {
        lot: OriginLotId,
        farmer: Address,
        quantity: Quantity,
    },
    NodeSplit {
        parent: NodeRef,
        children: Vec<NodeRef>,
    },
    ListingChanged {
        node: NodeRef,
        listing: Listing,
    },
    NodeDeactivated {
        node: NodeRef,
    },
    PurchaseCompleted {
        purchase: PurchaseId,
        node: NodeRef,
        child: Option<NodeRef>,
        total: Amount,
    },
    BuyRequestCreated {
        request: RequestId,
        pack: PackId,
        requester: Address,
        escrow: Amount,
    },
    BuyRequestApproved {
        request: RequestId,
        purchase: PurchaseId,
    },
    BuyRequestRejected {
        request: RequestId,
        reason: Option<RejectionReason>,
        refunded: Amount,
    },
}

impl LedgerEvent {
    /// Short name used as a log field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleRequested { .. } => "role_requested",
            Self::RoleApproved { .. } => "role_approved",
            Self::CustomerAssigned { .. } => "customer_assigned",
            Self::RetailerGranted { .. } => "retailer_granted",
            Self::OriginLotAdded { .. } => "origin_lot_added",
            Self::NodeSplit { .. } => "node_split",
            Self::ListingChanged { .. } => "listing_changed",
            Self::NodeDeactivated { .. } => "node_deactivated",
            Self::PurchaseCompleted { .. } => "purchase_completed",
            Self::BuyRequestCreated { .. } => "buy_request_created",
            Self::BuyRequestApproved { .. } => "buy_request_approved",
            Self::BuyRequestRejected { .. } => "buy_request_rejected",
        }
    }
}

/// Events of one commit, as handed to publishers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommittedEvents {
    pub correlation_id: Uuid,
    /// Store version produced by the commit.
    pub version: u64,
    pub events: Vec<LedgerEvent>,
}
