//! # Domain Layer - Identity & Role Registry
//!
//! - `registry`: `RoleRegistry`, the per-participant admission state machine

pub mod registry;

pub use registry::*;
