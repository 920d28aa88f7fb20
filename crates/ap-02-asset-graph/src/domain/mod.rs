//! # Domain Layer - Provenance Asset Graph
//!
//! - `graph`: typed node arena, split, listing and deactivation commands, projections
//! - `split`: split parameter validation
//! - `visibility`: the `can_discover` predicate

pub mod graph;
pub mod split;
pub mod visibility;

pub use graph::*;
pub use split::*;
pub use visibility::*;
