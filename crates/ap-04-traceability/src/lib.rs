//! # Traceability Reconstructor (ap-04)
//!
//! Rebuilds the chain of custody of any node from parent links and purchase
//! records. A pure read-side projection: it never mutates the ledger and works
//! against any [`ProvenanceSource`], typically a committed state snapshot.
//!
//! ```ignore
//! let trace = Trace::for_node(snapshot, NodeRef::Unit(unit));
//! for hop in trace.iter() {
//!     println!("{} ({}) -> {} ({}) @ {}", hop.seller, hop.seller_role, hop.buyer, hop.buyer_role, hop.price_per_unit);
//! }
//! ```

pub mod domain;
pub mod ports;

pub use domain::{Trace, TraceIter, MAX_TRACE_DEPTH};
pub use ports::ProvenanceSource;
