//! # Outbound Ports (Driven Ports)
//!
//! What the ledger service needs from its host: a transactional store, a
//! clock, and somewhere to send committed events.

use crate::events::CommittedEvents;
use crate::state::LedgerState;
use shared_types::{LedgerError, Timestamp};
use std::sync::Arc;
use thiserror::Error;

/// Repository for the single shared ledger state.
///
/// ## Contract
///
/// - `snapshot` never blocks on writers and returns a committed version.
/// - `transact` runs commands one at a time. The closure sees a private copy
///   of the latest state with `version` already advanced; the copy is
///   committed only if the closure returns `Ok`.
pub trait LedgerStore: Send + Sync {
    fn snapshot(&self) -> Arc<LedgerState>;

    /// Applies `command` atomically, returning its value and the state it
    /// committed.
    fn transact<T, F>(&self, command: F) -> Result<(T, Arc<LedgerState>), LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<T, LedgerError>;
}

/// Abstract interface for time operations.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Receives events after their commit.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, batch: &CommittedEvents) -> Result<(), PublishError>;
}

/// Error type for publish operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("event sink closed")]
    Closed,
    #[error("failed to serialize event: {0}")]
    Serialization(String),
}

impl<T: LedgerStore> LedgerStore for Arc<T> {
    fn snapshot(&self) -> Arc<LedgerState> {
        (**self).snapshot()
    }

    fn transact<R, F>(&self, command: F) -> Result<(R, Arc<LedgerState>), LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<R, LedgerError>,
    {
        (**self).transact(command)
    }
}

impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    fn publish(&self, batch: &CommittedEvents) -> Result<(), PublishError> {
        (**self).publish(batch)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
