//! # Exchange Engine (ap-03)
//!
//! Moves quantity between asset graph nodes and value between participants,
//! and records every completed transfer in a tamper-evident purchase log.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Exact payment | `required_payment` (checked multiply, exact match) |
//! | Escrow settles exactly once | `EscrowBook::take_hold` removes the hold before settling |
//! | Value conservation | `total_supplied == total_credited + escrow_held` |
//! | Purchase records immutable | `PurchaseLog` is append-only; `verify` recomputes the chain |
//! | Check-then-act on quantity | `Stock::ensure` and `AssetGraph::take` run in one store transaction |
//!
//! ## Protocols
//!
//! | Operation | Seller node | Errors |
//! |-----------|-------------|--------|
//! | `buy_direct` | OriginLot, RetailUnit | `NotFound`, `Unauthorized`, `NotAvailable`, `VisibilityDenied`, `InvalidQuantity`, `InsufficientQuantity`, `PaymentMismatch` |
//! | `create_buy_request` | Pack | as above |
//! | `resolve_buy_request` | Pack | `NoSuchRequest`, `Unauthorized`, `AlreadyResolved`, then `Resolution::Failed` |

pub mod domain;

pub use domain::{
    compute_record_hash, direct_acquisition, pack_acquisition, required_payment, verify_records,
    BalanceBook, DirectAcquisition, EscrowBook, EscrowHold, Exchange, LogIntegrityError,
    PackAcquisition, PurchaseDraft, PurchaseLog, PurchaseReceipt, Resolution, Settlement,
    CHUNK_LEN,
};
