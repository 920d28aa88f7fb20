//! # Shared Types Crate
//!
//! Ledger entities, typed references and errors shared by all provenance
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every entity of the provenance ledger
//!   (participants, lots, packs, retail units, buy requests, purchase
//!   records) is defined here once.
//! - **Typed References**: node ids are distinct newtypes. A Pack's parent can
//!   only be an `IntermediateLotId` or a `PackId`, never an arbitrary index.
//! - **Closed Role Set**: roles are a tagged enum matched exhaustively at every
//!   authorization check.
//!
//! ## Clusters
//!
//! - `primitives`: `Address`, node ids, `NodeRef`, `Hash`, quantities and amounts
//! - `roles`: `Role`, `AdmissionStatus`
//! - `entities`: nodes of the asset graph, `BuyRequest`, `PurchaseRecord`
//! - `errors`: `LedgerError`

pub mod entities;
pub mod errors;
pub mod primitives;
pub mod roles;

pub use entities::*;
pub use errors::*;
pub use primitives::*;
pub use roles::*;
