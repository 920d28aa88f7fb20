//! # Ledger Runtime
//!
//! Wires the provenance subsystems behind one transactional store.
//!
//! ## Subsystems
//!
//! | Crate | Role |
//! |-------|------|
//! | `ap-01-identity-registry` | participants, roles, admissions |
//! | `ap-02-asset-graph` | lots, packs, retail units, splits, visibility |
//! | `ap-03-exchange` | purchases, buy requests, escrow, purchase log |
//! | `ap-04-traceability` | origin-to-leaf custody chains |
//!
//! ## Consistency Model
//!
//! | Guarantee | Enforcement |
//! |-----------|-------------|
//! | All-or-nothing commands | `LedgerStore::transact` commits a private copy only on `Ok` |
//! | Linearized check-then-act | one writer at a time inside `transact` |
//! | Wait-free reads | readers clone an `Arc<LedgerState>` snapshot |
//! | Events follow commits | `ProvenanceLedger` publishes after `transact` returns |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let ledger = ProvenanceLedger::in_memory(admin);
//! ledger.request_role(farmer, Role::Farmer, None, None)?;
//! ledger.approve_role(admin, farmer, Role::Farmer)?;
//! let lot = ledger
//!     .add_origin_lot(farmer, attributes, 100, 5, Visibility::Public)?
//!     .into_value();
//! ```

pub mod adapters;
pub mod config;
pub mod events;
pub mod ports;
pub mod script;
pub mod service;
pub mod state;

pub use adapters::{
    InMemoryEventPublisher, InMemoryLedgerStore, ManualClock, NoOpPublisher, SystemTimeSource,
    TracingEventPublisher,
};
pub use config::{ConfigError, LedgerConfig};
pub use events::{CommittedEvents, LedgerEvent};
pub use ports::{EventPublisher, LedgerStore, PublishError, TimeSource};
pub use script::{execute, parse_script, Command, ErrorReport, Outcome};
pub use service::{Committed, ProvenanceLedger};
pub use state::{LedgerState, LedgerStats};
