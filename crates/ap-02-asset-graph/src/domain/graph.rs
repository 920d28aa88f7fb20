//! # Asset Graph - Typed Node Arena
//!
//! One ordered map per node kind, keyed by that kind's id. Parent links are
//! typed (`OriginLotId`, `PackParent`, `UnitParent`), so a pack can only hang
//! below an intermediate lot or another pack.
//!
//! ## Invariants Enforced
//!
//! - Children are only created from quantity taken from an available parent,
//!   so parent links are acyclic and `sum(children.original) <= parent.original`.
//! - `Stock::remaining` never underflows (`Stock::take`).
//! - A split is validated in full before any child is created.

use super::split::SplitRequest;
use super::visibility::{can_discover, Discoverable};
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Amount, IntermediateLot, IntermediateLotId, LedgerError, LedgerRef, Listing,
    NodeRef, OriginAttributes, OriginLot, OriginLotId, Pack, PackId, PackParent,
    PurchaseId, Quantity, RetailUnit, RetailUnitId, Role, Stock, Timestamp, UnitParent,
    Visibility,
};
use std::collections::BTreeMap;

/// Owner, quantity and pricing of any node, independent of its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSummary {
    pub node: NodeRef,
    pub owner: Address,
    pub stock: Stock,
    pub price_per_unit: Amount,
    pub visibility: Visibility,
    pub private_target: Option<Address>,
    pub listed: bool,
}

impl Discoverable for NodeSummary {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn private_target(&self) -> Option<Address> {
        self.private_target
    }
}

/// Everything one participant owns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub origin_lots: Vec<OriginLot>,
    pub intermediate_lots: Vec<IntermediateLot>,
    pub packs: Vec<Pack>,
    pub retail_units: Vec<RetailUnit>,
}

/// Node counts per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub origin_lots: usize,
    pub intermediate_lots: usize,
    pub packs: usize,
    pub retail_units: usize,
}

/// Where the children of a split attach.
#[derive(Clone, Copy)]
enum ChildSlot {
    Pack(PackParent),
    Unit(UnitParent),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct IdCounters {
    origin: u64,
    intermediate: u64,
    pack: u64,
    unit: u64,
}

/// The provenance asset graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetGraph {
    origin_lots: BTreeMap<OriginLotId, OriginLot>,
    intermediate_lots: BTreeMap<IntermediateLotId, IntermediateLot>,
    packs: BTreeMap<PackId, Pack>,
    retail_units: BTreeMap<RetailUnitId, RetailUnit>,
    ids: IdCounters,
}

fn not_found(node: impl Into<NodeRef>) -> LedgerError {
    LedgerError::NotFound(LedgerRef::Node(node.into()))
}

fn ensure_owner(owner: Address, caller: Address, node: NodeRef) -> Result<(), LedgerError> {
    if owner != caller {
        return Err(LedgerError::unauthorized(
            caller,
            format!("does not own {}", node),
        ));
    }
    Ok(())
}

impl AssetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn origin_lot(&self, id: OriginLotId) -> Result<&OriginLot, LedgerError> {
        self.origin_lots.get(&id).ok_or_else(|| not_found(id))
    }

    pub fn intermediate_lot(&self, id: IntermediateLotId) -> Result<&IntermediateLot, LedgerError> {
        self.intermediate_lots.get(&id).ok_or_else(|| not_found(id))
    }

    pub fn pack(&self, id: PackId) -> Result<&Pack, LedgerError> {
        self.packs.get(&id).ok_or_else(|| not_found(id))
    }

    pub fn retail_unit(&self, id: RetailUnitId) -> Result<&RetailUnit, LedgerError> {
        self.retail_units.get(&id).ok_or_else(|| not_found(id))
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Origin(id) => self.origin_lots.contains_key(&id),
            NodeRef::Intermediate(id) => self.intermediate_lots.contains_key(&id),
            NodeRef::Pack(id) => self.packs.contains_key(&id),
            NodeRef::Unit(id) => self.retail_units.contains_key(&id),
        }
    }

    /// Kind-independent view of a node.
    pub fn summary(&self, node: NodeRef) -> Result<NodeSummary, LedgerError> {
        let summary = match node {
            NodeRef::Origin(id) => {
                let lot = self.origin_lot(id)?;
                NodeSummary {
                    node,
                    owner: lot.owner,
                    stock: lot.stock,
                    price_per_unit: lot.price_per_unit,
                    visibility: lot.visibility,
                    private_target: None,
                    listed: lot.visibility == Visibility::Public,
                }
            }
            NodeRef::Intermediate(id) => {
                let lot = self.intermediate_lot(id)?;
                NodeSummary {
                    node,
                    owner: lot.owner,
                    stock: lot.stock,
                    price_per_unit: lot.acquisition_price_per_unit,
                    visibility: Visibility::Private,
                    private_target: None,
                    listed: false,
                }
            }
            NodeRef::Pack(id) => {
                let pack = self.pack(id)?;
                NodeSummary {
                    node,
                    owner: pack.owner,
                    stock: pack.stock,
                    price_per_unit: pack.price_per_unit,
                    visibility: pack.listing.visibility(),
                    private_target: pack.listing.private_target(),
                    listed: pack.listing.is_listed(),
                }
            }
            NodeRef::Unit(id) => {
                let unit = self.retail_unit(id)?;
                NodeSummary {
                    node,
                    owner: unit.owner,
                    stock: unit.stock,
                    price_per_unit: unit.price_per_unit,
                    visibility: unit.listing.visibility(),
                    private_target: unit.listing.private_target(),
                    listed: unit.listing.is_listed(),
                }
            }
        };
        Ok(summary)
    }

    /// Parent of a node, or `None` for origin lots and unknown nodes.
    pub fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        match node {
            NodeRef::Origin(_) => None,
            NodeRef::Intermediate(id) => self
                .intermediate_lots
                .get(&id)
                .map(|lot| NodeRef::Origin(lot.parent)),
            NodeRef::Pack(id) => self.packs.get(&id).map(|p| p.parent.into()),
            NodeRef::Unit(id) => self.retail_units.get(&id).map(|u| u.parent.into()),
        }
    }

    /// The purchase that created a node, if it was bought rather than split.
    pub fn acquired_via(&self, node: NodeRef) -> Option<PurchaseId> {
        match node {
            NodeRef::Origin(_) => None,
            NodeRef::Intermediate(id) => self.intermediate_lots.get(&id).map(|l| l.acquired_via),
            NodeRef::Pack(id) => self.packs.get(&id).and_then(|p| p.acquired_via),
            NodeRef::Unit(id) => self.retail_units.get(&id).and_then(|u| u.acquired_via),
        }
    }

    /// Direct children of a node, in creation order per kind.
    pub fn children_of(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut children = Vec::new();
        match node {
            NodeRef::Origin(id) => children.extend(
                self.intermediate_lots
                    .values()
                    .filter(|l| l.parent == id)
                    .map(IntermediateLot::node),
            ),
            NodeRef::Intermediate(id) => children.extend(
                self.packs
                    .values()
                    .filter(|p| p.parent == PackParent::Lot(id))
                    .map(Pack::node),
            ),
            NodeRef::Pack(id) => {
                children.extend(
                    self.packs
                        .values()
                        .filter(|p| p.parent == PackParent::Pack(id))
                        .map(Pack::node),
                );
                children.extend(
                    self.retail_units
                        .values()
                        .filter(|u| u.parent == UnitParent::Pack(id))
                        .map(RetailUnit::node),
                );
            }
            NodeRef::Unit(id) => children.extend(
                self.retail_units
                    .values()
                    .filter(|u| u.parent == UnitParent::Unit(id))
                    .map(RetailUnit::node),
            ),
        }
        children
    }

    fn stock_mut(&mut self, node: NodeRef) -> Result<&mut Stock, LedgerError> {
        let stock = match node {
            NodeRef::Origin(id) => self.origin_lots.get_mut(&id).map(|n| &mut n.stock),
            NodeRef::Intermediate(id) => self.intermediate_lots.get_mut(&id).map(|n| &mut n.stock),
            NodeRef::Pack(id) => self.packs.get_mut(&id).map(|n| &mut n.stock),
            NodeRef::Unit(id) => self.retail_units.get_mut(&id).map(|n| &mut n.stock),
        };
        stock.ok_or_else(|| not_found(node))
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Registers a farmer's origin lot.
    ///
    /// # Errors
    /// - `Unauthorized` unless `role` is Farmer
    /// - `InvalidQuantity` if `quantity` is 0
    #[allow(clippy::too_many_arguments)]
    pub fn add_origin_lot(
        &mut self,
        farmer: Address,
        role: Role,
        attributes: OriginAttributes,
        quantity: Quantity,
        price_per_unit: Amount,
        visibility: Visibility,
        now: Timestamp,
    ) -> Result<OriginLotId, LedgerError> {
        if role != Role::Farmer {
            return Err(LedgerError::unauthorized(farmer, "is not a farmer"));
        }
        if quantity == 0 {
            return Err(LedgerError::invalid_quantity("origin lot quantity must be positive"));
        }
        self.ids.origin += 1;
        let id = OriginLotId(self.ids.origin);
        self.origin_lots.insert(
            id,
            OriginLot {
                id,
                owner: farmer,
                attributes,
                stock: Stock::new(quantity),
                price_per_unit,
                visibility,
                created_at: now,
            },
        );
        Ok(id)
    }

    /// Splits `parent` into children owned by `caller`.
    ///
    /// Intermediate lots split into packs; packs and retail units split into
    /// retail units. Origin lots are only divided by purchase. `role` is the
    /// caller's registered role: distributors split intermediate lots and
    /// retailers split packs and units.
    ///
    /// # Errors
    /// - `NotFound` if `parent` does not exist
    /// - `Unauthorized` if `caller` does not own `parent`, `parent` is an origin
    ///   lot, or `role` may not split this kind of node
    /// - `NotAvailable` if `parent` is deactivated or empty
    /// - `ArityMismatch`, `InvalidQuantity`, `InsufficientQuantity` per [`SplitRequest::validate`]
    pub fn split(
        &mut self,
        caller: Address,
        role: Role,
        parent: NodeRef,
        request: &SplitRequest,
        now: Timestamp,
    ) -> Result<Vec<NodeRef>, LedgerError> {
        let summary = self.summary(parent)?;
        ensure_owner(summary.owner, caller, parent)?;
        let (slot, splitter) = match parent {
            NodeRef::Origin(_) => {
                return Err(LedgerError::unauthorized(
                    caller,
                    "origin lots are divided by purchase only",
                ))
            }
            NodeRef::Intermediate(id) => (ChildSlot::Pack(PackParent::Lot(id)), Role::Distributor),
            NodeRef::Pack(id) => (ChildSlot::Unit(UnitParent::Pack(id)), Role::Retailer),
            NodeRef::Unit(id) => (ChildSlot::Unit(UnitParent::Unit(id)), Role::Retailer),
        };
        if role != splitter {
            return Err(LedgerError::unauthorized(
                caller,
                format!("{} cannot split {}", role, parent),
            ));
        }
        if !summary.stock.is_available() {
            return Err(LedgerError::NotAvailable(parent));
        }
        let total = request.validate(parent, &summary.stock)?;

        // Validated in full; nothing below can fail.
        self.stock_mut(parent)?.take(parent, total)?;
        let mut children = Vec::with_capacity(request.len());
        for line in request.lines() {
            let metadata = line.metadata.to_string();
            let child = match slot {
                ChildSlot::Pack(pack_parent) => NodeRef::Pack(self.insert_pack(
                    pack_parent,
                    caller,
                    line.quantity,
                    line.price_per_unit,
                    metadata,
                    None,
                    now,
                )),
                ChildSlot::Unit(unit_parent) => NodeRef::Unit(self.insert_unit(
                    unit_parent,
                    caller,
                    line.quantity,
                    line.price_per_unit,
                    metadata,
                    None,
                    now,
                )),
            };
            children.push(child);
        }
        Ok(children)
    }

    /// Sets the listing of a pack.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` (not the owner), `NotAvailable`.
    pub fn list_pack(
        &mut self,
        caller: Address,
        id: PackId,
        listing: Listing,
    ) -> Result<(), LedgerError> {
        let pack = self.packs.get_mut(&id).ok_or_else(|| not_found(id))?;
        ensure_owner(pack.owner, caller, NodeRef::Pack(id))?;
        if !pack.stock.is_available() {
            return Err(LedgerError::NotAvailable(NodeRef::Pack(id)));
        }
        pack.listing = listing;
        Ok(())
    }

    /// Lists a retail unit for customers.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` (not the owner), `NotAvailable`.
    pub fn list_unit(
        &mut self,
        caller: Address,
        id: RetailUnitId,
        listing: Listing,
    ) -> Result<(), LedgerError> {
        let unit = self.retail_units.get_mut(&id).ok_or_else(|| not_found(id))?;
        ensure_owner(unit.owner, caller, NodeRef::Unit(id))?;
        if !unit.stock.is_available() {
            return Err(LedgerError::NotAvailable(NodeRef::Unit(id)));
        }
        unit.listing = listing;
        Ok(())
    }

    /// Owner-initiated, terminal deactivation of any node.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` (not the owner), `NotAvailable` if already
    /// deactivated.
    pub fn deactivate(&mut self, caller: Address, node: NodeRef) -> Result<(), LedgerError> {
        let summary = self.summary(node)?;
        ensure_owner(summary.owner, caller, node)?;
        let stock = self.stock_mut(node)?;
        if stock.deactivated {
            return Err(LedgerError::NotAvailable(node));
        }
        stock.deactivate();
        Ok(())
    }

    // =========================================================================
    // EXCHANGE HOOKS
    // =========================================================================

    /// Removes `quantity` from a node being sold from.
    pub fn take(&mut self, node: NodeRef, quantity: Quantity) -> Result<(), LedgerError> {
        self.stock_mut(node)?.take(node, quantity)
    }

    /// Creates the intermediate lot a distributor receives from an origin lot.
    pub fn create_intermediate_lot(
        &mut self,
        parent: OriginLotId,
        owner: Address,
        quantity: Quantity,
        acquisition_price_per_unit: Amount,
        acquired_via: PurchaseId,
        now: Timestamp,
    ) -> IntermediateLotId {
        self.ids.intermediate += 1;
        let id = IntermediateLotId(self.ids.intermediate);
        self.intermediate_lots.insert(
            id,
            IntermediateLot {
                id,
                parent,
                owner,
                stock: Stock::new(quantity),
                acquisition_price_per_unit,
                acquired_via,
                created_at: now,
            },
        );
        id
    }

    /// Creates the pack a distributor receives from another distributor's pack.
    /// The new pack keeps the seller's price and metadata and starts unlisted.
    pub fn create_pack_from_pack(
        &mut self,
        parent: PackId,
        owner: Address,
        quantity: Quantity,
        acquired_via: PurchaseId,
        now: Timestamp,
    ) -> Result<PackId, LedgerError> {
        let source = self.pack(parent)?;
        let (price, metadata) = (source.price_per_unit, source.metadata.clone());
        Ok(self.insert_pack(
            PackParent::Pack(parent),
            owner,
            quantity,
            price,
            metadata,
            Some(acquired_via),
            now,
        ))
    }

    /// Creates the retail unit a retailer receives from a pack.
    pub fn create_unit_from_pack(
        &mut self,
        parent: PackId,
        owner: Address,
        quantity: Quantity,
        acquired_via: PurchaseId,
        now: Timestamp,
    ) -> Result<RetailUnitId, LedgerError> {
        let source = self.pack(parent)?;
        let (price, metadata) = (source.price_per_unit, source.metadata.clone());
        Ok(self.insert_unit(
            UnitParent::Pack(parent),
            owner,
            quantity,
            price,
            metadata,
            Some(acquired_via),
            now,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_pack(
        &mut self,
        parent: PackParent,
        owner: Address,
        quantity: Quantity,
        price_per_unit: Amount,
        metadata: String,
        acquired_via: Option<PurchaseId>,
        now: Timestamp,
    ) -> PackId {
        self.ids.pack += 1;
        let id = PackId(self.ids.pack);
        self.packs.insert(
            id,
            Pack {
                id,
                parent,
                owner,
                stock: Stock::new(quantity),
                price_per_unit,
                listing: Listing::Unlisted,
                metadata,
                acquired_via,
                created_at: now,
            },
        );
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_unit(
        &mut self,
        parent: UnitParent,
        owner: Address,
        quantity: Quantity,
        price_per_unit: Amount,
        metadata: String,
        acquired_via: Option<PurchaseId>,
        now: Timestamp,
    ) -> RetailUnitId {
        self.ids.unit += 1;
        let id = RetailUnitId(self.ids.unit);
        self.retail_units.insert(
            id,
            RetailUnit {
                id,
                parent,
                owner,
                stock: Stock::new(quantity),
                price_per_unit,
                listing: Listing::Unlisted,
                metadata,
                acquired_via,
                created_at: now,
            },
        );
        id
    }

    // =========================================================================
    // PROJECTIONS
    // =========================================================================

    /// Every node owned by `owner`.
    pub fn inventory_of(&self, owner: &Address) -> Inventory {
        Inventory {
            origin_lots: self
                .origin_lots
                .values()
                .filter(|n| n.owner == *owner)
                .cloned()
                .collect(),
            intermediate_lots: self
                .intermediate_lots
                .values()
                .filter(|n| n.owner == *owner)
                .cloned()
                .collect(),
            packs: self
                .packs
                .values()
                .filter(|n| n.owner == *owner)
                .cloned()
                .collect(),
            retail_units: self
                .retail_units
                .values()
                .filter(|n| n.owner == *owner)
                .cloned()
                .collect(),
        }
    }

    /// Public, available origin lots.
    pub fn public_origin_lots(&self) -> Vec<&OriginLot> {
        self.origin_lots
            .values()
            .filter(|n| n.visibility == Visibility::Public && n.stock.is_available())
            .collect()
    }

    /// Public, available packs.
    pub fn public_packs(&self) -> Vec<&Pack> {
        self.packs
            .values()
            .filter(|n| n.listing == Listing::Public && n.stock.is_available())
            .collect()
    }

    /// Public, available retail units.
    pub fn public_retail_units(&self) -> Vec<&RetailUnit> {
        self.retail_units
            .values()
            .filter(|n| n.listing == Listing::Public && n.stock.is_available())
            .collect()
    }

    /// Available packs `participant` may target, including private listings
    /// naming them.
    pub fn discoverable_packs(&self, participant: &Address) -> Vec<&Pack> {
        self.packs
            .values()
            .filter(|n| n.stock.is_available() && can_discover(participant, *n))
            .collect()
    }

    pub fn counts(&self) -> GraphCounts {
        GraphCounts {
            origin_lots: self.origin_lots.len(),
            intermediate_lots: self.intermediate_lots.len(),
            packs: self.packs.len(),
            retail_units: self.retail_units.len(),
        }
    }

    /// Every node, origin lots first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.origin_lots
            .values()
            .map(OriginLot::node)
            .chain(self.intermediate_lots.values().map(IntermediateLot::node))
            .chain(self.packs.values().map(Pack::node))
            .chain(self.retail_units.values().map(RetailUnit::node))
    }

    /// Nodes whose children hold more than the node ever had, or whose
    /// children plus remaining quantity exceed the original.
    ///
    /// Empty on a consistent graph.
    pub fn conservation_violations(&self) -> Vec<NodeRef> {
        self.nodes()
            .filter(|node| {
                let Ok(summary) = self.summary(*node) else {
                    return true;
                };
                let handed_down = self
                    .children_of(*node)
                    .into_iter()
                    .filter_map(|c| self.summary(c).ok())
                    .try_fold(summary.stock.remaining, |acc, c| {
                        acc.checked_add(c.stock.original)
                    });
                !matches!(handed_down, Some(total) if total <= summary.stock.original)
            })
            .collect()
    }
}
