//! Adapters implementing the runtime's outbound ports.

pub mod publisher;
pub mod store;
pub mod time;

pub use publisher::{InMemoryEventPublisher, NoOpPublisher, TracingEventPublisher};
pub use store::InMemoryLedgerStore;
pub use time::{ManualClock, SystemTimeSource};
