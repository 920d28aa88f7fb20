//! # Domain Layer - Exchange Engine
//!
//! - `exchange`: direct and request-based purchase protocols
//! - `matching`: buyer role vs. seller node compatibility
//! - `escrow`: escrow holds, settlements and credited balances
//! - `purchase_log`: append-only, SHA-256 chained purchase records

pub mod escrow;
pub mod exchange;
pub mod matching;
pub mod purchase_log;

pub use escrow::*;
pub use exchange::*;
pub use matching::*;
pub use purchase_log::*;
