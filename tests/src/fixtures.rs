//! Shared participants and ledger builders.

use ap_02_asset_graph::SplitRequest;
use ledger_runtime::{InMemoryEventPublisher, InMemoryLedgerStore, ManualClock, ProvenanceLedger};
use shared_types::{
    Address, Amount, IntermediateLotId, Listing, NodeRef, OriginAttributes, OriginLotId, PackId,
    Quantity, RequestId, Role, Visibility,
};
use std::sync::Arc;

pub const ADMIN: Address = Address::repeat(0xAD);
pub const FARMER: Address = Address::repeat(0x0F);
pub const DISTRIBUTOR: Address = Address::repeat(0x0D);
pub const DISTRIBUTOR_2: Address = Address::repeat(0x2D);
pub const RETAILER: Address = Address::repeat(0x0E);
pub const RETAILER_2: Address = Address::repeat(0x2E);
pub const CUSTOMER: Address = Address::repeat(0x0C);

/// Clock value at genesis.
pub const GENESIS: u64 = 1_700_000_000;

pub type TestLedger =
    ProvenanceLedger<InMemoryLedgerStore, Arc<InMemoryEventPublisher>, Arc<ManualClock>>;

/// A ledger plus handles on its event sink and clock.
pub struct Network {
    pub ledger: TestLedger,
    pub events: Arc<InMemoryEventPublisher>,
    pub clock: Arc<ManualClock>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Empty ledger administered by [`ADMIN`].
    pub fn new() -> Self {
        let events = Arc::new(InMemoryEventPublisher::new());
        let clock = Arc::new(ManualClock::new(GENESIS));
        let ledger = ProvenanceLedger::new(
            InMemoryLedgerStore::new(ADMIN),
            Arc::clone(&events),
            Arc::clone(&clock),
        );
        Self {
            ledger,
            events,
            clock,
        }
    }

    /// Ledger with one farmer, two distributors, two retailers and a customer.
    pub fn with_participants() -> Self {
        let net = Self::new();
        net.admit(FARMER, Role::Farmer);
        net.admit(DISTRIBUTOR, Role::Distributor);
        net.admit(DISTRIBUTOR_2, Role::Distributor);
        net.admit(RETAILER, Role::Retailer);
        net.admit(RETAILER_2, Role::Retailer);
        net.customer(CUSTOMER);
        net
    }

    /// Requests and approves `role` for `who`.
    pub fn admit(&self, who: Address, role: Role) {
        self.ledger
            .request_role(who, role, None, None)
            .expect("request role");
        self.ledger
            .approve_role(ADMIN, who, role)
            .expect("approve role");
    }

    pub fn customer(&self, who: Address) {
        self.ledger.assign_customer(who).expect("assign customer");
    }

    /// Public origin lot owned by [`FARMER`].
    pub fn origin_lot(&self, quantity: Quantity, price: Amount) -> OriginLotId {
        self.ledger
            .add_origin_lot(FARMER, attributes("wheat"), quantity, price, Visibility::Public)
            .expect("add origin lot")
            .into_value()
    }

    /// Distributor buys `quantity` from an origin lot at its listed price.
    pub fn buy_lot(&self, buyer: Address, lot: OriginLotId, quantity: Quantity) -> IntermediateLotId {
        let node = NodeRef::Origin(lot);
        let price = self.ledger.node(node).expect("origin lot").price_per_unit;
        let receipt = self
            .ledger
            .buy_direct(buyer, node, quantity, Amount::from(quantity) * price)
            .expect("buy origin lot")
            .into_value();
        match receipt.child {
            Some(NodeRef::Intermediate(id)) => id,
            other => panic!("expected an intermediate lot, got {:?}", other),
        }
    }

    /// Splits `parent` into children of the given quantities, all at `price`.
    pub fn split(&self, owner: Address, parent: NodeRef, quantities: &[Quantity], price: Amount) -> Vec<NodeRef> {
        self.ledger
            .split(owner, parent, &split_request(quantities, price))
            .expect("split")
            .into_value()
    }

    /// Splits an intermediate lot into packs and lists each one publicly.
    pub fn public_packs(
        &self,
        owner: Address,
        lot: IntermediateLotId,
        quantities: &[Quantity],
        price: Amount,
    ) -> Vec<PackId> {
        self.split(owner, NodeRef::Intermediate(lot), quantities, price)
            .into_iter()
            .map(|node| match node {
                NodeRef::Pack(id) => {
                    self.ledger
                        .list_pack(owner, id, Listing::Public)
                        .expect("list pack");
                    id
                }
                other => panic!("expected a pack, got {:?}", other),
            })
            .collect()
    }

    /// Files a request paying the exact price.
    pub fn request(
        &self,
        requester: Address,
        pack: PackId,
        quantity: Quantity,
        wants_retailer_role: bool,
    ) -> RequestId {
        let price = self
            .ledger
            .node(NodeRef::Pack(pack))
            .expect("pack")
            .price_per_unit;
        self.ledger
            .create_buy_request(
                requester,
                pack,
                quantity,
                wants_retailer_role,
                Amount::from(quantity) * price,
            )
            .expect("create buy request")
            .into_value()
    }
}

pub fn attributes(crop: &str) -> OriginAttributes {
    OriginAttributes {
        crop_name: crop.to_string(),
        crop_period: "2024-rabi".to_string(),
        days_to_harvest: 110,
        location: "Punjab".to_string(),
        metadata: None,
    }
}

pub fn split_request(quantities: &[Quantity], price: Amount) -> SplitRequest {
    SplitRequest::new(
        quantities.to_vec(),
        vec![price; quantities.len()],
        quantities.iter().map(|q| format!("child of {}", q)).collect(),
    )
}
