//! # Role Registry - Admission State Machine
//!
//! ```text
//! [None] ──requestRole──→ [Pending] ──approveRole──→ [Approved]
//!                            │  ↑
//!                            └──┘ requestRole (overwrites)
//! ```
//!
//! Customer is self-assigned without admission. Retailer may additionally be
//! granted by an accepted buy request (see [`RoleRegistry::grant_retailer`]).

use serde::{Deserialize, Serialize};
use shared_types::{
    AdmissionStatus, Address, LedgerError, Participant, RequestRef, Role, Timestamp,
};
use std::collections::BTreeMap;

/// Participants and their admission state.
///
/// The admin address is fixed at construction and never stored as a
/// participant entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleRegistry {
    admin: Address,
    participants: BTreeMap<Address, Participant>,
}

impl RoleRegistry {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            participants: BTreeMap::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        *address == self.admin
    }

    /// Current role of `address`; unknown addresses are `Unassigned`.
    pub fn role_of(&self, address: &Address) -> Role {
        if self.is_admin(address) {
            return Role::Admin;
        }
        self.participants
            .get(address)
            .map(|p| p.role)
            .unwrap_or_default()
    }

    pub fn participant(&self, address: &Address) -> Option<&Participant> {
        self.participants.get(address)
    }

    /// Creates or overwrites a pending admission for `requester`.
    ///
    /// # Errors
    /// - `InvalidRole` unless `role` is Farmer, Distributor or Retailer
    /// - `AlreadyAssigned` if the requester already holds an admitted role
    pub fn request_role(
        &mut self,
        requester: Address,
        role: Role,
        id_hash: Option<String>,
        meta: Option<String>,
        now: Timestamp,
    ) -> Result<&Participant, LedgerError> {
        if !role.is_requestable() {
            return Err(LedgerError::InvalidRole(role));
        }
        let current = self.role_of(&requester);
        if !current.can_be_admitted() {
            return Err(LedgerError::AlreadyAssigned {
                address: requester,
                role: current,
            });
        }

        let entry = self
            .participants
            .entry(requester)
            .or_insert_with(|| Participant::unknown(requester));
        entry.admission_status = AdmissionStatus::Pending;
        entry.requested_role = Some(role);
        entry.id_hash = id_hash;
        entry.meta = meta;
        entry.applied_at = Some(now);
        Ok(entry)
    }

    /// Grants `role` to a requester with a pending admission.
    ///
    /// The admin picks the granted role, which need not match the requested one.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the admin (checked first)
    /// - `InvalidRole` if `role` is not requestable
    /// - `NoSuchRequest` if the requester never applied
    /// - `AlreadyResolved` if the admission was already approved
    pub fn approve_role(
        &mut self,
        caller: Address,
        requester: Address,
        role: Role,
    ) -> Result<&Participant, LedgerError> {
        if !self.is_admin(&caller) {
            return Err(LedgerError::unauthorized(caller, "is not the admin"));
        }
        if !role.is_requestable() {
            return Err(LedgerError::InvalidRole(role));
        }

        let entry = self
            .participants
            .get_mut(&requester)
            .ok_or(LedgerError::NoSuchRequest(RequestRef::Admission(requester)))?;
        match entry.admission_status {
            AdmissionStatus::None => {
                return Err(LedgerError::NoSuchRequest(RequestRef::Admission(requester)))
            }
            AdmissionStatus::Approved => {
                return Err(LedgerError::AlreadyResolved(RequestRef::Admission(
                    requester,
                )))
            }
            AdmissionStatus::Pending => {}
        }

        entry.role = role;
        entry.admission_status = AdmissionStatus::Approved;
        entry.requested_role = None;
        Ok(entry)
    }

    /// Self-assigns the Customer role.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the participant holds any role other than Unassigned.
    pub fn assign_customer(&mut self, requester: Address) -> Result<&Participant, LedgerError> {
        let current = self.role_of(&requester);
        if current != Role::Unassigned {
            return Err(LedgerError::AlreadyAssigned {
                address: requester,
                role: current,
            });
        }
        let entry = self
            .participants
            .entry(requester)
            .or_insert_with(|| Participant::unknown(requester));
        entry.role = Role::Customer;
        Ok(entry)
    }

    /// Admits `address` as Retailer through an accepted buy request.
    ///
    /// Counts as the participant's single admission: any pending role request
    /// is resolved by it. A no-op for existing Retailers.
    ///
    /// # Errors
    /// `AlreadyAssigned` if the participant holds a role other than
    /// Unassigned, Customer or Retailer.
    pub fn grant_retailer(&mut self, address: Address) -> Result<(), LedgerError> {
        let current = self.role_of(&address);
        if current == Role::Retailer {
            return Ok(());
        }
        if !current.can_be_admitted() {
            return Err(LedgerError::AlreadyAssigned {
                address,
                role: current,
            });
        }
        let entry = self
            .participants
            .entry(address)
            .or_insert_with(|| Participant::unknown(address));
        entry.role = Role::Retailer;
        entry.admission_status = AdmissionStatus::Approved;
        entry.requested_role = None;
        Ok(())
    }

    /// Participants awaiting admin approval, ordered by address.
    pub fn pending_admissions(&self) -> Vec<&Participant> {
        self.participants
            .values()
            .filter(|p| p.admission_status == AdmissionStatus::Pending)
            .collect()
    }

    /// Addresses currently holding `role`.
    pub fn participants_with_role(&self, role: Role) -> Vec<Address> {
        if role == Role::Admin {
            return vec![self.admin];
        }
        self.participants
            .values()
            .filter(|p| p.role == role)
            .map(|p| p.address)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
