//! # Error Types
//!
//! Every ledger command fails with exactly one `LedgerError`. All of them are
//! well-typed rejections of a single operation; none are fatal and none are
//! retried by the core.

use crate::primitives::{Address, Amount, NodeRef, PurchaseId, Quantity, RequestId};
use crate::roles::Role;
use std::fmt;
use thiserror::Error;

/// A request the ledger tracks: a role admission (keyed by requester) or a
/// buy request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestRef {
    Admission(Address),
    Buy(RequestId),
}

impl fmt::Display for RequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestRef::Admission(addr) => write!(f, "admission of {}", addr),
            RequestRef::Buy(id) => id.fmt(f),
        }
    }
}

/// A ledger entity that can be looked up by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerRef {
    Node(NodeRef),
    Purchase(PurchaseId),
}

impl fmt::Display for LedgerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerRef::Node(node) => node.fmt(f),
            LedgerRef::Purchase(id) => id.fmt(f),
        }
    }
}

/// Errors returned by ledger commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller lacks the required role or ownership.
    #[error("Unauthorized: {caller} {reason}")]
    Unauthorized { caller: Address, reason: String },

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(LedgerRef),

    /// Referenced request does not exist.
    #[error("No such request: {0}")]
    NoSuchRequest(RequestRef),

    /// Node was deactivated or fully consumed.
    #[error("Not available: {0}")]
    NotAvailable(NodeRef),

    /// Requested quantity exceeds what remains at the node.
    #[error("Insufficient quantity at {node}: requested {requested}, remaining {remaining}")]
    InsufficientQuantity {
        node: NodeRef,
        requested: Quantity,
        remaining: Quantity,
    },

    /// Malformed quantity parameter.
    #[error("Invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    /// Split parameter vectors differ in length.
    #[error("Arity mismatch: {quantities} quantities, {prices} prices, {metadata} metadata")]
    ArityMismatch {
        quantities: usize,
        prices: usize,
        metadata: usize,
    },

    /// Supplied value differs from quantity x price.
    #[error("Payment mismatch: required {required}, supplied {supplied}")]
    PaymentMismatch { required: Amount, supplied: Amount },

    /// Node is private and caller is not its designated buyer.
    #[error("Visibility denied: {caller} cannot discover {node}")]
    VisibilityDenied { node: NodeRef, caller: Address },

    /// Request already reached a terminal state.
    #[error("Already resolved: {0}")]
    AlreadyResolved(RequestRef),

    /// Participant already holds a role.
    #[error("Already assigned: {address} holds role {role}")]
    AlreadyAssigned { address: Address, role: Role },

    /// Role cannot be requested or granted this way.
    #[error("Invalid role: {0}")]
    InvalidRole(Role),

    /// Stored figures contradict each other, as in a state restored from an
    /// inconsistent export.
    #[error("Internal inconsistency: {reason}")]
    Internal { reason: String },
}

impl LedgerError {
    /// Stable short code for logs and script output.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized { .. } => "unauthorized",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::NoSuchRequest(_) => "no_such_request",
            LedgerError::NotAvailable(_) => "not_available",
            LedgerError::InsufficientQuantity { .. } => "insufficient_quantity",
            LedgerError::InvalidQuantity { .. } => "invalid_quantity",
            LedgerError::ArityMismatch { .. } => "arity_mismatch",
            LedgerError::PaymentMismatch { .. } => "payment_mismatch",
            LedgerError::VisibilityDenied { .. } => "visibility_denied",
            LedgerError::AlreadyResolved(_) => "already_resolved",
            LedgerError::AlreadyAssigned { .. } => "already_assigned",
            LedgerError::InvalidRole(_) => "invalid_role",
            LedgerError::Internal { .. } => "internal",
        }
    }

    /// Shorthand for an `Unauthorized` error.
    pub fn unauthorized(caller: Address, reason: impl Into<String>) -> Self {
        LedgerError::Unauthorized {
            caller,
            reason: reason.into(),
        }
    }

    /// Shorthand for an `InvalidQuantity` error.
    pub fn invalid_quantity(reason: impl Into<String>) -> Self {
        LedgerError::InvalidQuantity {
            reason: reason.into(),
        }
    }

    /// Shorthand for an `Internal` error.
    pub fn internal(reason: impl Into<String>) -> Self {
        LedgerError::Internal {
            reason: reason.into(),
        }
    }
}
