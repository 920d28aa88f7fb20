//! # Provenance Asset Graph (ap-02)
//!
//! The hierarchical lot model and its visibility rules.
//!
//! ```text
//! OriginLot ──buy──→ IntermediateLot ──split──→ Pack ──buy──→ Pack
//!                                                 │
//!                                                 ├──split/buy──→ RetailUnit ──split──→ RetailUnit
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Quantity conservation | `SplitRequest::validate`, `Stock::take` |
//! | No negative quantities | `Stock::take` checks before subtracting |
//! | Available iff remaining > 0 and not deactivated | `Stock::is_available` |
//! | Typed, acyclic parent links | `PackParent`, `UnitParent`; children only created from existing parents |
//! | Atomic split | full validation precedes the first mutation |
//!
//! Role checks beyond ownership are made by the caller; the graph only knows
//! that origin lots belong to farmers.

pub mod domain;

pub use domain::{
    can_discover, AssetGraph, Discoverable, GraphCounts, Inventory, NodeSummary, SplitLine,
    SplitRequest,
};
