//! Role compatibility between buyers and the node kinds they buy from.
//!
//! | Seller node | Buyer role | Protocol | Buyer receives |
//! |-------------|------------|----------|----------------|
//! | OriginLot | Distributor | direct | IntermediateLot |
//! | RetailUnit | Customer | direct | nothing (consumption) |
//! | Pack | Unassigned/Customer/Retailer, wants retailer | request | RetailUnit (+ Retailer role) |
//! | Pack | Retailer | request | RetailUnit |
//! | Pack | Distributor | request | Pack |
//! | Pack | Customer | request | nothing (consumption) |

use shared_types::{NodeKind, Role};

/// What a buyer receives from a direct purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectAcquisition {
    IntermediateLot,
    Consumption,
}

/// What a requester receives when a pack buy request is approved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackAcquisition {
    RetailUnit { grants_retailer: bool },
    Restock,
    Consumption,
}

/// Direct purchase plan, or `None` if `role` may not buy `kind` directly.
pub fn direct_acquisition(role: Role, kind: NodeKind) -> Option<DirectAcquisition> {
    match (kind, role) {
        (NodeKind::OriginLot, Role::Distributor) => Some(DirectAcquisition::IntermediateLot),
        (NodeKind::RetailUnit, Role::Customer) => Some(DirectAcquisition::Consumption),
        _ => None,
    }
}

/// Pack acquisition plan, or `None` if the combination is not allowed.
pub fn pack_acquisition(role: Role, wants_retailer_role: bool) -> Option<PackAcquisition> {
    match (role, wants_retailer_role) {
        (Role::Unassigned | Role::Customer, true) => Some(PackAcquisition::RetailUnit {
            grants_retailer: true,
        }),
        (Role::Retailer, _) => Some(PackAcquisition::RetailUnit {
            grants_retailer: false,
        }),
        (Role::Distributor, false) => Some(PackAcquisition::Restock),
        (Role::Customer, false) => Some(PackAcquisition::Consumption),
        (Role::Unassigned, false)
        | (Role::Distributor, true)
        | (Role::Farmer, _)
        | (Role::Admin, _) => None,
    }
}
