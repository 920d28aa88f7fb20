//! # Identity & Role Registry (ap-01)
//!
//! Tracks each participant's role and admission state. Every other subsystem
//! consults it for authorization.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Admin fixed at initialization | `RoleRegistry::new`, no setter |
//! | A role is set by at most one admission | `request_role` rejects admitted participants |
//! | Roles are never revoked implicitly | no operation lowers a role |
//! | Only the admin approves | `approve_role` checks the caller before anything else |
//!
//! ## Operations
//!
//! | Operation | Caller | Errors |
//! |-----------|--------|--------|
//! | `request_role` | anyone | `InvalidRole`, `AlreadyAssigned` |
//! | `approve_role` | admin | `Unauthorized`, `InvalidRole`, `NoSuchRequest`, `AlreadyResolved` |
//! | `assign_customer` | anyone | `AlreadyAssigned` |
//! | `grant_retailer` | exchange engine | `AlreadyAssigned` |

pub mod domain;

pub use domain::RoleRegistry;
