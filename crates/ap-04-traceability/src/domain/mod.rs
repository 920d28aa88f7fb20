//! # Domain Layer - Traceability Reconstructor

pub mod trace;

pub use trace::*;
