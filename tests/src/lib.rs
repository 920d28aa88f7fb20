//! # Provenance Ledger Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Shared participants and ledger builders
//! └── integration/       # Cross-crate scenarios
//!     ├── scenarios.rs   # End-to-end supply chain walkthroughs
//!     ├── conservation.rs# Seeded random operation sequences
//!     ├── escrow.rs      # Settle-exactly-once checks
//!     ├── concurrency.rs # Multi-threaded linearizability checks
//!     └── traceability.rs# Custody chain round trips
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ap-tests
//!
//! # By category
//! cargo test -p ap-tests integration::conservation::
//!
//! # Benchmarks
//! cargo bench -p ap-tests
//! ```

pub mod fixtures;
pub mod integration;
