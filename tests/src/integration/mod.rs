//! Cross-crate scenarios driven through [`ledger_runtime::ProvenanceLedger`].

#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod conservation;
#[cfg(test)]
mod escrow;
#[cfg(test)]
mod traceability;
