//! Split parameter validation.
//!
//! A split is validated completely before the graph is touched, so a rejected
//! split never leaves a partially created child behind.

use serde::{Deserialize, Serialize};
use shared_types::{Amount, LedgerError, NodeRef, Quantity, Stock};

/// Parallel vectors describing the children of one split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRequest {
    pub quantities: Vec<Quantity>,
    pub prices: Vec<Amount>,
    pub metadata: Vec<String>,
}

/// One child of a validated split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLine<'a> {
    pub quantity: Quantity,
    pub price_per_unit: Amount,
    pub metadata: &'a str,
}

impl SplitRequest {
    pub fn new(quantities: Vec<Quantity>, prices: Vec<Amount>, metadata: Vec<String>) -> Self {
        Self {
            quantities,
            prices,
            metadata,
        }
    }

    /// Number of children requested.
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Validates the request against the parent's stock and returns the total
    /// quantity to take from the parent.
    ///
    /// # Errors
    /// - `ArityMismatch` if the three vectors differ in length
    /// - `InvalidQuantity` if empty, if any quantity is 0, or if the sum overflows
    /// - `InsufficientQuantity` if the sum exceeds the parent's remaining quantity
    pub fn validate(&self, parent: NodeRef, stock: &Stock) -> Result<Quantity, LedgerError> {
        let (q, p, m) = (self.quantities.len(), self.prices.len(), self.metadata.len());
        if q != p || q != m {
            return Err(LedgerError::ArityMismatch {
                quantities: q,
                prices: p,
                metadata: m,
            });
        }
        if self.is_empty() {
            return Err(LedgerError::invalid_quantity("split needs at least one child"));
        }
        if self.quantities.contains(&0) {
            return Err(LedgerError::invalid_quantity("split quantities must be positive"));
        }

        let total = self
            .quantities
            .iter()
            .try_fold(0 as Quantity, |acc, q| acc.checked_add(*q))
            .ok_or_else(|| LedgerError::invalid_quantity("split quantities overflow"))?;

        if total > stock.remaining {
            return Err(LedgerError::InsufficientQuantity {
                node: parent,
                requested: total,
                remaining: stock.remaining,
            });
        }
        Ok(total)
    }

    /// Children in request order. Only meaningful after `validate` succeeded.
    pub fn lines(&self) -> impl Iterator<Item = SplitLine<'_>> {
        self.quantities
            .iter()
            .zip(&self.prices)
            .zip(&self.metadata)
            .map(|((quantity, price), metadata)| SplitLine {
                quantity: *quantity,
                price_per_unit: *price,
                metadata: metadata.as_str(),
            })
    }
}
