//! # Outbound Ports (Driven Ports)
//!
//! What the reconstructor needs from the ledger. Implemented by the runtime
//! over a committed state snapshot.

use shared_types::{NodeRef, PurchaseId, PurchaseRecord};
use std::sync::Arc;

/// Read access to parent links and purchase records.
pub trait ProvenanceSource {
    /// True if the node exists.
    fn contains(&self, node: NodeRef) -> bool;

    /// Parent reference stored on the node, if any.
    fn parent_of(&self, node: NodeRef) -> Option<NodeRef>;

    /// Purchase that created the node, if it was bought rather than split.
    fn acquired_via(&self, node: NodeRef) -> Option<PurchaseId>;

    fn purchase(&self, id: PurchaseId) -> Option<PurchaseRecord>;
}

impl<T: ProvenanceSource + ?Sized> ProvenanceSource for &T {
    fn contains(&self, node: NodeRef) -> bool {
        (**self).contains(node)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        (**self).parent_of(node)
    }

    fn acquired_via(&self, node: NodeRef) -> Option<PurchaseId> {
        (**self).acquired_via(node)
    }

    fn purchase(&self, id: PurchaseId) -> Option<PurchaseRecord> {
        (**self).purchase(id)
    }
}

impl<T: ProvenanceSource + ?Sized> ProvenanceSource for Arc<T> {
    fn contains(&self, node: NodeRef) -> bool {
        (**self).contains(node)
    }

    fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        (**self).parent_of(node)
    }

    fn acquired_via(&self, node: NodeRef) -> Option<PurchaseId> {
        (**self).acquired_via(node)
    }

    fn purchase(&self, id: PurchaseId) -> Option<PurchaseRecord> {
        (**self).purchase(id)
    }
}
