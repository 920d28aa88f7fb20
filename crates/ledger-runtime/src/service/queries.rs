//! Read projections. Every query reads one committed snapshot.

use super::ProvenanceLedger;
use crate::ports::{EventPublisher, LedgerStore, TimeSource};
use crate::state::{LedgerState, LedgerStats};
use ap_02_asset_graph::{Inventory, NodeSummary};
use ap_03_exchange::LogIntegrityError;
use ap_04_traceability::Trace;
use ledger_telemetry::{log_event, log_node_event};
use shared_types::{
    Address, Amount, BuyRequest, LedgerError, LedgerRef, NodeRef, OriginLot, Pack, Participant,
    PurchaseId, PurchaseRecord, RequestId, RetailUnit, Role,
};
use std::sync::Arc;
use tracing::instrument;

impl<S, P, T> ProvenanceLedger<S, P, T>
where
    S: LedgerStore,
    P: EventPublisher,
    T: TimeSource,
{
    /// Latest committed state.
    pub fn snapshot(&self) -> Arc<LedgerState> {
        self.store.snapshot()
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    pub fn role_of(&self, address: &Address) -> Role {
        self.snapshot().registry.role_of(address)
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.snapshot().registry.is_admin(address)
    }

    pub fn participant(&self, address: &Address) -> Option<Participant> {
        self.snapshot().registry.participant(address).cloned()
    }

    /// Participants waiting for the admin.
    pub fn pending_admissions(&self) -> Vec<Participant> {
        self.snapshot()
            .registry
            .pending_admissions()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn participants_with_role(&self, role: Role) -> Vec<Address> {
        self.snapshot().registry.participants_with_role(role)
    }

    // =========================================================================
    // INVENTORY & LISTINGS
    // =========================================================================

    #[instrument(level = "debug", skip_all, fields(owner = %owner))]
    pub fn inventory_of(&self, owner: &Address) -> Inventory {
        let inventory = self.snapshot().graph.inventory_of(owner);
        log_event!(
            debug,
            "asset_graph",
            "inventory listed",
            origin_lots = inventory.origin_lots.len(),
            intermediate_lots = inventory.intermediate_lots.len(),
            packs = inventory.packs.len(),
            retail_units = inventory.retail_units.len()
        );
        inventory
    }

    pub fn node(&self, node: NodeRef) -> Result<NodeSummary, LedgerError> {
        self.snapshot().graph.summary(node)
    }

    pub fn public_origin_lots(&self) -> Vec<OriginLot> {
        self.snapshot()
            .graph
            .public_origin_lots()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn public_packs(&self) -> Vec<Pack> {
        self.snapshot()
            .graph
            .public_packs()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn public_retail_units(&self) -> Vec<RetailUnit> {
        self.snapshot()
            .graph
            .public_retail_units()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Packs `participant` may target, including private listings naming them.
    pub fn discoverable_packs(&self, participant: &Address) -> Vec<Pack> {
        self.snapshot()
            .graph
            .discoverable_packs(participant)
            .into_iter()
            .cloned()
            .collect()
    }

    // =========================================================================
    // EXCHANGE
    // =========================================================================

    /// Pending requests against packs owned by `owner`.
    pub fn pending_buy_requests(&self, owner: &Address) -> Vec<BuyRequest> {
        let snapshot = self.snapshot();
        snapshot
            .exchange
            .pending_requests_for(&snapshot.graph, owner)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every request filed by `requester`, in any status.
    pub fn requests_by(&self, requester: &Address) -> Vec<BuyRequest> {
        self.snapshot()
            .exchange
            .requests_by(requester)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn buy_request(&self, id: RequestId) -> Result<BuyRequest, LedgerError> {
        self.snapshot().exchange.request(id).cloned()
    }

    /// Purchases where `participant` was buyer or seller, oldest first.
    pub fn purchase_history(&self, participant: &Address) -> Vec<PurchaseRecord> {
        self.snapshot()
            .exchange
            .purchase_history(participant)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn purchase(&self, id: PurchaseId) -> Result<PurchaseRecord, LedgerError> {
        self.snapshot().exchange.purchase(id).cloned()
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.snapshot().exchange.balance_of(address)
    }

    pub fn escrow_held(&self) -> Amount {
        self.snapshot().exchange.escrow_held()
    }

    // =========================================================================
    // TRACEABILITY
    // =========================================================================

    /// Custody chain of `node`, origin first, over the current snapshot.
    ///
    /// # Errors
    /// `NotFound` if the node does not exist.
    #[instrument(level = "debug", skip_all, fields(node = %node))]
    pub fn trace(&self, node: NodeRef) -> Result<Trace<Arc<LedgerState>>, LedgerError> {
        let snapshot = self.snapshot();
        if !snapshot.graph.contains(node) {
            return Err(LedgerError::NotFound(LedgerRef::Node(node)));
        }
        log_node_event!(debug, "traceability", "trace requested", node);
        Ok(Trace::for_node(snapshot, node))
    }

    /// Custody chain of the node a purchase was made from, ending with the
    /// purchase itself.
    ///
    /// # Errors
    /// `NotFound` if the purchase does not exist.
    #[instrument(level = "debug", skip_all, fields(purchase = %purchase))]
    pub fn purchase_trace(
        &self,
        purchase: PurchaseId,
    ) -> Result<Trace<Arc<LedgerState>>, LedgerError> {
        Trace::for_purchase(self.snapshot(), purchase)
    }

    // =========================================================================
    // INTEGRITY & STATISTICS
    // =========================================================================

    /// Recomputes the purchase log hash chain.
    pub fn verify_purchase_log(&self) -> Result<(), LogIntegrityError> {
        let result = self.snapshot().exchange.verify_purchase_log();
        if let Err(error) = &result {
            log_event!(error, "exchange", "purchase log failed verification", error = %error);
        }
        result
    }

    pub fn stats(&self) -> LedgerStats {
        self.snapshot().stats()
    }
}
