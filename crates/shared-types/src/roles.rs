//! # Roles
//!
//! Closed set of participant roles and the admission state attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role held by a participant.
///
/// `Admin` is held only by the address fixed at ledger initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unassigned,
    Farmer,
    Distributor,
    Retailer,
    Customer,
    Admin,
}

impl Role {
    /// Roles that can be requested from the admin.
    pub fn is_requestable(self) -> bool {
        match self {
            Role::Farmer | Role::Distributor | Role::Retailer => true,
            Role::Unassigned | Role::Customer | Role::Admin => false,
        }
    }

    /// True if a participant holding this role may still receive an admission.
    ///
    /// Customer is self-assigned without approval, so it does not consume the
    /// single admission a participant may receive.
    pub fn can_be_admitted(self) -> bool {
        match self {
            Role::Unassigned | Role::Customer => true,
            Role::Farmer | Role::Distributor | Role::Retailer | Role::Admin => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Unassigned => "Unassigned",
            Role::Farmer => "Farmer",
            Role::Distributor => "Distributor",
            Role::Retailer => "Retailer",
            Role::Customer => "Customer",
            Role::Admin => "Admin",
        };
        f.write_str(name)
    }
}

/// Admission state of a participant's role request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    #[default]
    None,
    Pending,
    Approved,
}
