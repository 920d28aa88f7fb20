//! Port traits for the traceability reconstructor.

pub mod outbound;

pub use outbound::ProvenanceSource;
