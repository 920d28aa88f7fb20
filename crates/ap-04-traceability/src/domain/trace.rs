//! # Trace Reconstruction
//!
//! ```text
//! leaf ──parent──→ ... ──parent──→ origin        (walk up, ids only)
//! origin ──→ ... ──→ leaf                        (yield, fetching records lazily)
//! ```
//!
//! The upward walk stops at an origin lot, at a parent reference that points
//! to a missing node, at a repeated node, or after `MAX_TRACE_DEPTH` hops. Edges
//! created by a split carry no purchase and yield nothing.

use crate::ports::ProvenanceSource;
use shared_types::{LedgerError, LedgerRef, NodeRef, PurchaseId, TraceEntry};
use std::collections::HashSet;

/// Upper bound on hops walked from a leaf towards its origin.
pub const MAX_TRACE_DEPTH: usize = 4096;

/// Custody chain of one node, optionally extended by a purchase made from it.
///
/// Iterating is lazy and can be repeated; each call to [`Trace::iter`] walks
/// the source again.
#[derive(Clone, Debug)]
pub struct Trace<S> {
    source: S,
    leaf: NodeRef,
    tail: Option<PurchaseId>,
}

impl<S: ProvenanceSource> Trace<S> {
    /// Trace from the origin down to `leaf`. An unknown leaf yields nothing.
    pub fn for_node(source: S, leaf: NodeRef) -> Self {
        Self {
            source,
            leaf,
            tail: None,
        }
    }

    /// Trace of the node a purchase was made from, followed by the purchase.
    ///
    /// # Errors
    /// `NotFound` if the purchase does not exist.
    pub fn for_purchase(source: S, purchase: PurchaseId) -> Result<Self, LedgerError> {
        let record = source
            .purchase(purchase)
            .ok_or(LedgerError::NotFound(LedgerRef::Purchase(purchase)))?;
        Ok(Self {
            source,
            leaf: record.node,
            tail: Some(purchase),
        })
    }

    pub fn leaf(&self) -> NodeRef {
        self.leaf
    }

    pub fn iter(&self) -> TraceIter<'_, S> {
        TraceIter {
            source: &self.source,
            leaf: self.leaf,
            tail: self.tail,
            path: None,
        }
    }

    /// Collects the whole chain.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.iter().collect()
    }
}

impl<'a, S: ProvenanceSource> IntoIterator for &'a Trace<S> {
    type Item = TraceEntry;
    type IntoIter = TraceIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Nodes from the trace root down to the leaf.
fn ancestry<S: ProvenanceSource>(source: &S, leaf: NodeRef) -> Vec<NodeRef> {
    if !source.contains(leaf) {
        return Vec::new();
    }
    let mut path = vec![leaf];
    let mut seen = HashSet::from([leaf]);
    let mut current = leaf;
    while path.len() < MAX_TRACE_DEPTH {
        let Some(parent) = source.parent_of(current) else {
            break;
        };
        if !source.contains(parent) || !seen.insert(parent) {
            break;
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Lazy iterator over a [`Trace`], origin first.
pub struct TraceIter<'a, S> {
    source: &'a S,
    leaf: NodeRef,
    tail: Option<PurchaseId>,
    /// Remaining nodes, reversed so `pop` yields the next one towards the leaf.
    path: Option<Vec<NodeRef>>,
}

impl<S: ProvenanceSource> Iterator for TraceIter<'_, S> {
    type Item = TraceEntry;

    fn next(&mut self) -> Option<TraceEntry> {
        let source = self.source;
        let leaf = self.leaf;
        let path = self.path.get_or_insert_with(|| {
            let mut nodes = ancestry(source, leaf);
            nodes.reverse();
            nodes
        });

        while let Some(node) = path.pop() {
            if let Some(record) = source.acquired_via(node).and_then(|id| source.purchase(id)) {
                return Some(TraceEntry::from(&record));
            }
        }

        let record = self.tail.take().and_then(|id| source.purchase(id))?;
        Some(TraceEntry::from(&record))
    }
}
