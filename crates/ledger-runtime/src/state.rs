//! # Ledger State
//!
//! One committed version of everything the ledger knows. The store hands out
//! immutable `Arc<LedgerState>` snapshots to readers and swaps in a new value
//! on every successful command.

use ap_01_identity_registry::RoleRegistry;
use ap_02_asset_graph::{AssetGraph, GraphCounts};
use ap_03_exchange::Exchange;
use ap_04_traceability::ProvenanceSource;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, NodeRef, PurchaseId, PurchaseRecord};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerState {
    pub registry: RoleRegistry,
    pub graph: AssetGraph,
    pub exchange: Exchange,
    /// Number of commits applied since genesis.
    pub version: u64,
}

/// Aggregate counters over one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub nodes: GraphCounts,
    pub participants: usize,
    pub pending_requests: usize,
    pub purchases: usize,
    pub escrow_held: Amount,
    pub version: u64,
}

impl LedgerState {
    /// Empty ledger administered by `admin`.
    pub fn genesis(admin: Address) -> Self {
        Self {
            registry: RoleRegistry::new(admin),
            graph: AssetGraph::new(),
            exchange: Exchange::new(),
            version: 0,
        }
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            nodes: self.graph.counts(),
            participants: self.registry.len(),
            pending_requests: self.exchange.pending_count(),
            purchases: self.exchange.purchase_count(),
            escrow_held: self.exchange.escrow_held(),
            version: self.version,
        }
    }
}

impl ProvenanceSource for LedgerState {
    fn contains(&self, node: NodeRef) -> bool {
        self.graph.contains(node)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        self.graph.parent_of(node)
    }

    fn acquired_via(&self, node: NodeRef) -> Option<PurchaseId> {
        self.graph.acquired_via(node)
    }

    fn purchase(&self, id: PurchaseId) -> Option<PurchaseRecord> {
        self.exchange.purchase(id).ok().cloned()
    }
}
