//! Event publisher adapters.

use crate::events::CommittedEvents;
use crate::ports::{EventPublisher, PublishError};
use parking_lot::Mutex;
use tracing::info;

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPublisher;

impl EventPublisher for NoOpPublisher {
    fn publish(&self, _batch: &CommittedEvents) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Writes each event to the log as JSON under the `ledger::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, batch: &CommittedEvents) -> Result<(), PublishError> {
        for event in &batch.events {
            let payload = serde_json::to_string(event)
                .map_err(|e| PublishError::Serialization(e.to_string()))?;
            info!(
                target: "ledger::events",
                correlation_id = %batch.correlation_id,
                version = batch.version,
                event = event.name(),
                payload = %payload,
                "ledger event"
            );
        }
        Ok(())
    }
}

/// Keeps every published batch in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    batches: Mutex<Vec<CommittedEvents>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<CommittedEvents> {
        self.batches.lock().clone()
    }

    /// Removes and returns everything published so far.
    pub fn drain(&self) -> Vec<CommittedEvents> {
        std::mem::take(&mut *self.batches.lock())
    }

    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.lock().is_empty()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, batch: &CommittedEvents) -> Result<(), PublishError> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}
