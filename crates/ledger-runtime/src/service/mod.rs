//! # Provenance Ledger Service
//!
//! The command and query surface offered to the presentation layer.
//!
//! ## Architecture
//!
//! This service:
//! 1. Runs every command inside one [`LedgerStore::transact`] call, so a
//!    command either commits completely or leaves no trace
//! 2. Reads from immutable snapshots, never waiting on writers
//! 3. Publishes the events of each commit after it lands
//! 4. Uses dependency injection for the store, event sink and clock
//!
//! ## Command Flow
//!
//! ```text
//! command ──→ span(correlation_id) ──→ store.transact(domain call)
//!                                          │
//!                       ┌──────── Ok ──────┴────── Err ────────┐
//!                       ↓                                      ↓
//!            info "committed" + publish             warn "rejected", no effect
//! ```

mod commands;
mod queries;

use crate::adapters::{InMemoryLedgerStore, SystemTimeSource, TracingEventPublisher};
use crate::events::{CommittedEvents, LedgerEvent};
use crate::ports::{EventPublisher, LedgerStore, TimeSource};
use crate::state::LedgerState;
use ledger_telemetry::log_event;
use shared_types::{Address, LedgerError, Timestamp};
use std::sync::Arc;
use tracing::{field, Span};
use uuid::Uuid;

/// Value returned by a successful command, with the state it committed.
#[derive(Clone, Debug)]
pub struct Committed<T> {
    pub value: T,
    pub snapshot: Arc<LedgerState>,
}

impl<T> Committed<T> {
    /// Store version produced by the command.
    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// The provenance ledger.
pub struct ProvenanceLedger<S, P, T>
where
    S: LedgerStore,
    P: EventPublisher,
    T: TimeSource,
{
    store: S,
    publisher: P,
    clock: T,
}

impl ProvenanceLedger<InMemoryLedgerStore, TracingEventPublisher, SystemTimeSource> {
    /// Fresh in-memory ledger on the wall clock, publishing events to the log.
    pub fn in_memory(admin: Address) -> Self {
        Self::new(
            InMemoryLedgerStore::new(admin),
            TracingEventPublisher,
            SystemTimeSource,
        )
    }
}

impl<S, P, T> ProvenanceLedger<S, P, T>
where
    S: LedgerStore,
    P: EventPublisher,
    T: TimeSource,
{
    pub fn new(store: S, publisher: P, clock: T) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `apply` as one transaction and publishes its events on commit.
    ///
    /// Records a fresh correlation id on the current span.
    fn commit<R, F>(&self, command: &'static str, apply: F) -> Result<Committed<R>, LedgerError>
    where
        F: FnOnce(&mut LedgerState, Timestamp) -> Result<(R, Vec<LedgerEvent>), LedgerError>,
    {
        let correlation_id = Uuid::new_v4();
        Span::current().record("correlation_id", field::display(correlation_id));
        let now = self.clock.now();

        match self.store.transact(|state| apply(state, now)) {
            Ok(((value, events), snapshot)) => {
                log_event!(
                    info,
                    "runtime",
                    "command committed",
                    command = command,
                    version = snapshot.version,
                    events = events.len()
                );
                self.publish(CommittedEvents {
                    correlation_id,
                    version: snapshot.version,
                    events,
                });
                Ok(Committed { value, snapshot })
            }
            Err(error) => {
                log_event!(
                    warn,
                    "runtime",
                    "command rejected",
                    command = command,
                    code = error.code(),
                    error = %error
                );
                Err(error)
            }
        }
    }

    fn publish(&self, batch: CommittedEvents) {
        if batch.events.is_empty() {
            return;
        }
        // The commit stands regardless; a lost event is only logged.
        if let Err(error) = self.publisher.publish(&batch) {
            log_event!(
                error,
                "runtime",
                "failed to publish ledger events",
                version = batch.version,
                error = %error
            );
        }
    }
}
