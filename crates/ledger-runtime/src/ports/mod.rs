//! Ports of the ledger runtime.

pub mod outbound;

pub use outbound::{EventPublisher, LedgerStore, PublishError, TimeSource};
