//! # Ledger Entities
//!
//! Participants, the four node kinds of the asset graph, buy requests and
//! purchase records.
//!
//! Quantity bookkeeping for every node kind goes through [`Stock`], so the
//! conservation and availability rules are enforced in exactly one place.

use crate::errors::LedgerError;
use crate::primitives::{
    Address, Amount, Hash, IntermediateLotId, NodeRef, OriginLotId, PackId, PackParent,
    PurchaseId, Quantity, RequestId, RetailUnitId, Timestamp, UnitParent,
};
use crate::roles::{AdmissionStatus, Role};
use serde::{Deserialize, Serialize};

// =============================================================================
// PARTICIPANTS
// =============================================================================

/// A participant known to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: Address,
    pub role: Role,
    pub admission_status: AdmissionStatus,
    /// Role asked for by the latest pending admission.
    pub requested_role: Option<Role>,
    /// Hash of an off-ledger identity document.
    pub id_hash: Option<String>,
    pub meta: Option<String>,
    pub applied_at: Option<Timestamp>,
}

impl Participant {
    /// A participant the ledger has never seen.
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            role: Role::Unassigned,
            admission_status: AdmissionStatus::None,
            requested_role: None,
            id_hash: None,
            meta: None,
            applied_at: None,
        }
    }
}

// =============================================================================
// STOCK
// =============================================================================

/// Quantity state of a single node.
///
/// `remaining` only ever decreases, and a node is available iff it still has
/// quantity and its owner has not deactivated it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub original: Quantity,
    pub remaining: Quantity,
    pub deactivated: bool,
}

impl Stock {
    pub fn new(quantity: Quantity) -> Self {
        Self {
            original: quantity,
            remaining: quantity,
            deactivated: false,
        }
    }

    /// True iff the node can still be split or sold from.
    pub fn is_available(&self) -> bool {
        !self.deactivated && self.remaining > 0
    }

    /// Quantity that has left this node through splits or purchases.
    ///
    /// # Errors
    /// `Internal` if `remaining` exceeds `original`.
    pub fn consumed(&self) -> Result<Quantity, LedgerError> {
        self.original.checked_sub(self.remaining).ok_or_else(|| {
            LedgerError::internal(format!(
                "remaining {} exceeds original {}",
                self.remaining, self.original
            ))
        })
    }

    /// Checks that `quantity` can be taken from the node without taking it.
    pub fn ensure(&self, node: NodeRef, quantity: Quantity) -> Result<(), LedgerError> {
        if !self.is_available() {
            return Err(LedgerError::NotAvailable(node));
        }
        if quantity == 0 {
            return Err(LedgerError::invalid_quantity("quantity must be positive"));
        }
        if quantity > self.remaining {
            return Err(LedgerError::InsufficientQuantity {
                node,
                requested: quantity,
                remaining: self.remaining,
            });
        }
        Ok(())
    }

    /// Removes `quantity` from the node. Leaves the stock untouched on error.
    pub fn take(&mut self, node: NodeRef, quantity: Quantity) -> Result<(), LedgerError> {
        self.ensure(node, quantity)?;
        self.remaining -= quantity;
        Ok(())
    }

    /// Marks the node inactive. Terminal.
    pub fn deactivate(&mut self) {
        self.deactivated = true;
    }
}

// =============================================================================
// VISIBILITY
// =============================================================================

/// Discoverability of an origin lot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Listing state of a pack or retail unit.
///
/// A freshly split node is `Unlisted`, which nobody can discover. A private
/// listing always names exactly one target, so the "target required iff
/// private" rule holds by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "visibility", rename_all = "snake_case")]
pub enum Listing {
    #[default]
    Unlisted,
    Public,
    Private { target: Address },
}

impl Listing {
    /// Visibility the listing exposes; unlisted nodes count as private.
    pub fn visibility(&self) -> Visibility {
        match self {
            Listing::Public => Visibility::Public,
            Listing::Unlisted | Listing::Private { .. } => Visibility::Private,
        }
    }

    /// The designated buyer of a private listing.
    pub fn private_target(&self) -> Option<Address> {
        match self {
            Listing::Private { target } => Some(*target),
            Listing::Unlisted | Listing::Public => None,
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, Listing::Unlisted)
    }
}

// =============================================================================
// ASSET GRAPH NODES
// =============================================================================

/// Descriptive attributes a farmer records on an origin lot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginAttributes {
    pub crop_name: String,
    pub crop_period: String,
    pub days_to_harvest: u32,
    pub location: String,
    /// Content hash of off-ledger documents.
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Producer-created lot at the root of every provenance chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginLot {
    pub id: OriginLotId,
    pub owner: Address,
    pub attributes: OriginAttributes,
    pub stock: Stock,
    pub price_per_unit: Amount,
    pub visibility: Visibility,
    pub created_at: Timestamp,
}

impl OriginLot {
    pub fn node(&self) -> NodeRef {
        NodeRef::Origin(self.id)
    }
}

/// Quantity a distributor bought from an origin lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateLot {
    pub id: IntermediateLotId,
    pub parent: OriginLotId,
    pub owner: Address,
    pub stock: Stock,
    pub acquisition_price_per_unit: Amount,
    pub acquired_via: PurchaseId,
    pub created_at: Timestamp,
}

impl IntermediateLot {
    pub fn node(&self) -> NodeRef {
        NodeRef::Intermediate(self.id)
    }
}

/// Distributor-held pack, split from an intermediate lot or bought from
/// another pack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub id: PackId,
    pub parent: PackParent,
    pub owner: Address,
    pub stock: Stock,
    pub price_per_unit: Amount,
    pub listing: Listing,
    pub metadata: String,
    /// Set when the pack was bought rather than split.
    pub acquired_via: Option<PurchaseId>,
    pub created_at: Timestamp,
}

impl Pack {
    pub fn node(&self) -> NodeRef {
        NodeRef::Pack(self.id)
    }
}

/// Retailer-held unit offered to customers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailUnit {
    pub id: RetailUnitId,
    pub parent: UnitParent,
    pub owner: Address,
    pub stock: Stock,
    pub price_per_unit: Amount,
    pub listing: Listing,
    pub metadata: String,
    pub acquired_via: Option<PurchaseId>,
    pub created_at: Timestamp,
}

impl RetailUnit {
    pub fn node(&self) -> NodeRef {
        NodeRef::Unit(self.id)
    }

    pub fn listed_for_customers(&self) -> bool {
        self.listing.is_listed()
    }
}

// =============================================================================
// EXCHANGE
// =============================================================================

/// Lifecycle of a buy request. `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Why a buy request ended up rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    SellerDeclined,
    InsufficientQuantity,
    NotAvailable,
    /// The requester's role no longer allows the acquisition.
    RequesterIneligible,
}

/// A pending or resolved offer to buy quantity from a pack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    pub id: RequestId,
    pub pack: PackId,
    pub requester: Address,
    pub quantity: Quantity,
    pub wants_retailer_role: bool,
    pub escrow_amount: Amount,
    pub status: RequestStatus,
    pub rejection: Option<RejectionReason>,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl BuyRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Immutable record of one completed transfer of quantity.
///
/// `child` is the node created for the buyer; a customer purchase is a
/// consumption and has none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub node: NodeRef,
    pub child: Option<NodeRef>,
    pub seller: Address,
    pub buyer: Address,
    pub seller_role: Role,
    pub buyer_role: Role,
    pub quantity: Quantity,
    pub price_per_unit: Amount,
    pub total: Amount,
    pub timestamp: Timestamp,
    #[serde(with = "hex_hash")]
    pub prev_hash: Hash,
    #[serde(with = "hex_hash")]
    pub record_hash: Hash,
}

/// One custody hop of a reconstructed trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub purchase_id: PurchaseId,
    /// The node quantity was bought from.
    pub node: NodeRef,
    pub seller: Address,
    pub seller_role: Role,
    pub buyer: Address,
    pub buyer_role: Role,
    pub price_per_unit: Amount,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
}

impl From<&PurchaseRecord> for TraceEntry {
    fn from(record: &PurchaseRecord) -> Self {
        Self {
            purchase_id: record.id,
            node: record.node,
            seller: record.seller,
            seller_role: record.seller_role,
            buyer: record.buyer,
            buyer_role: record.buyer_role,
            price_per_unit: record.price_per_unit,
            quantity: record.quantity,
            timestamp: record.timestamp,
        }
    }
}

mod hex_hash {
    use crate::primitives::Hash;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(&raw).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| de::Error::invalid_length(b.len(), &"32 bytes"))
    }
}
