//! # Escrow and Balances
//!
//! Value moves through two books:
//!
//! - `EscrowBook`: payments held for pending buy requests. Each hold is
//!   settled exactly once, either to the seller or back to the payer.
//! - `BalanceBook`: credited value per participant (sale proceeds and refunds).
//!
//! Together they keep `total_supplied == total_credited + escrow_held`.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, LedgerError, RequestId, RequestRef};
use std::collections::BTreeMap;

/// A payment held against one buy request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowHold {
    pub payer: Address,
    pub amount: Amount,
}

/// Final destination of an escrowed payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
    CreditedToSeller { seller: Address, amount: Amount },
    RefundedToPayer { payer: Address, amount: Amount },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EscrowBook {
    held: BTreeMap<RequestId, EscrowHold>,
    settled: BTreeMap<RequestId, Settlement>,
    total_held: Amount,
}

impl EscrowBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `amount` for `request`.
    ///
    /// # Errors
    /// `AlreadyResolved` if the request already has a hold or a settlement.
    pub fn hold(
        &mut self,
        request: RequestId,
        payer: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if self.held.contains_key(&request) || self.settled.contains_key(&request) {
            return Err(LedgerError::AlreadyResolved(RequestRef::Buy(request)));
        }
        let total_held = self
            .total_held
            .checked_add(amount)
            .ok_or(LedgerError::PaymentMismatch {
                required: Amount::MAX - self.total_held,
                supplied: amount,
            })?;
        self.held.insert(request, EscrowHold { payer, amount });
        self.total_held = total_held;
        Ok(())
    }

    /// Releases the hold of `request` to `seller`.
    pub fn release_to_seller(
        &mut self,
        request: RequestId,
        seller: Address,
    ) -> Result<Settlement, LedgerError> {
        let hold = self.take_hold(request)?;
        let settlement = Settlement::CreditedToSeller {
            seller,
            amount: hold.amount,
        };
        self.settled.insert(request, settlement);
        Ok(settlement)
    }

    /// Returns the hold of `request` to its payer.
    pub fn refund(&mut self, request: RequestId) -> Result<Settlement, LedgerError> {
        let hold = self.take_hold(request)?;
        let settlement = Settlement::RefundedToPayer {
            payer: hold.payer,
            amount: hold.amount,
        };
        self.settled.insert(request, settlement);
        Ok(settlement)
    }

    fn take_hold(&mut self, request: RequestId) -> Result<EscrowHold, LedgerError> {
        if self.settled.contains_key(&request) {
            return Err(LedgerError::AlreadyResolved(RequestRef::Buy(request)));
        }
        let hold = *self
            .held
            .get(&request)
            .ok_or(LedgerError::NoSuchRequest(RequestRef::Buy(request)))?;
        self.total_held = self.total_held.checked_sub(hold.amount).ok_or_else(|| {
            LedgerError::internal(format!(
                "escrow total {} is below the {} held for {}",
                self.total_held, hold.amount, request
            ))
        })?;
        self.held.remove(&request);
        Ok(hold)
    }

    pub fn hold_of(&self, request: RequestId) -> Option<&EscrowHold> {
        self.held.get(&request)
    }

    pub fn settlement_of(&self, request: RequestId) -> Option<&Settlement> {
        self.settled.get(&request)
    }

    pub fn total_held(&self) -> Amount {
        self.total_held
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceBook {
    balances: BTreeMap<Address, Amount>,
    total_supplied: Amount,
    total_credited: Amount,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records value paid into the ledger.
    ///
    /// Must precede the matching credit or hold, which keeps every balance
    /// bounded by `total_supplied`.
    ///
    /// # Errors
    /// `PaymentMismatch` if the running total would overflow.
    pub fn record_supplied(&mut self, amount: Amount) -> Result<(), LedgerError> {
        self.total_supplied =
            self.total_supplied
                .checked_add(amount)
                .ok_or(LedgerError::PaymentMismatch {
                    required: Amount::MAX - self.total_supplied,
                    supplied: amount,
                })?;
        Ok(())
    }

    /// Credits `amount` to `to`.
    pub fn credit(&mut self, to: Address, amount: Amount) {
        // Bounded by total_supplied, which is overflow-checked.
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        self.total_credited = self.total_credited.saturating_add(amount);
    }

    /// Applies an escrow settlement.
    pub fn settle(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::CreditedToSeller { seller, amount } => self.credit(seller, amount),
            Settlement::RefundedToPayer { payer, amount } => self.credit(payer, amount),
        }
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn total_supplied(&self) -> Amount {
        self.total_supplied
    }

    pub fn total_credited(&self) -> Amount {
        self.total_credited
    }
}
