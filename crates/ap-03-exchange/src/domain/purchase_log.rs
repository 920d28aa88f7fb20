//! # Purchase Log - Hash-Chained Append-Only Records
//!
//! ```text
//! record_hash[i] = SHA-256(prev_hash[i] || fields[i])
//! prev_hash[0]   = ZERO_HASH
//! prev_hash[i]   = record_hash[i-1]
//! ```
//!
//! Records are never mutated or removed once appended.
//!
//! ```text
//! sealed: [Arc<[64]>] [Arc<[64]>] ... ─┐  shared between clones
//! tail:   Vec<_; < 64>                 ─┘  copied on clone
//! ```
//!
//! Every full chunk is frozen behind an `Arc`, so cloning the log (and with
//! it a ledger state) copies chunk pointers and at most one partial chunk.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use shared_types::{
    Address, Amount, Hash, NodeRef, PurchaseId, PurchaseRecord, Quantity, Role, Timestamp,
    ZERO_HASH,
};
use std::sync::Arc;
use thiserror::Error;

/// Records per sealed chunk.
pub const CHUNK_LEN: usize = 64;

/// Fields of a purchase before it is numbered and chained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseDraft {
    pub node: NodeRef,
    pub child: Option<NodeRef>,
    pub seller: Address,
    pub buyer: Address,
    pub seller_role: Role,
    pub buyer_role: Role,
    pub quantity: Quantity,
    pub price_per_unit: Amount,
    pub total: Amount,
    pub timestamp: Timestamp,
}

/// A broken link found by [`PurchaseLog::verify`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogIntegrityError {
    #[error("{purchase}: prev_hash {found} does not match predecessor {expected}")]
    BrokenLink {
        purchase: PurchaseId,
        expected: String,
        found: String,
    },

    #[error("{purchase}: record_hash does not match its contents")]
    HashMismatch { purchase: PurchaseId },

    #[error("record at position {position} carries id {found}")]
    OutOfSequence { position: usize, found: PurchaseId },
}

#[derive(Clone, Debug, Default)]
pub struct PurchaseLog {
    sealed: Vec<Arc<[PurchaseRecord]>>,
    tail: Vec<PurchaseRecord>,
}

impl Serialize for PurchaseLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Records<'a>(&'a PurchaseLog);

        impl Serialize for Records<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.0.records())
            }
        }

        let mut state = serializer.serialize_struct("PurchaseLog", 1)?;
        state.serialize_field("records", &Records(self))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PurchaseLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Stored {
            records: Vec<PurchaseRecord>,
        }

        let stored = Stored::deserialize(deserializer)?;
        Ok(Self::from_records(stored.records))
    }
}

fn node_tag(node: &NodeRef) -> (u8, u64) {
    match node {
        NodeRef::Origin(id) => (1, id.get()),
        NodeRef::Intermediate(id) => (2, id.get()),
        NodeRef::Pack(id) => (3, id.get()),
        NodeRef::Unit(id) => (4, id.get()),
    }
}

fn role_tag(role: Role) -> u8 {
    match role {
        Role::Unassigned => 0,
        Role::Farmer => 1,
        Role::Distributor => 2,
        Role::Retailer => 3,
        Role::Customer => 4,
        Role::Admin => 5,
    }
}

/// Canonical digest of a record's contents, chained to `prev_hash`.
pub fn compute_record_hash(record: &PurchaseRecord) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(record.prev_hash);
    hasher.update(record.id.get().to_be_bytes());

    let (kind, id) = node_tag(&record.node);
    hasher.update([kind]);
    hasher.update(id.to_be_bytes());
    match &record.child {
        Some(child) => {
            let (kind, id) = node_tag(child);
            hasher.update([kind]);
            hasher.update(id.to_be_bytes());
        }
        None => hasher.update([0u8]),
    }

    hasher.update(record.seller.as_bytes());
    hasher.update(record.buyer.as_bytes());
    hasher.update([role_tag(record.seller_role), role_tag(record.buyer_role)]);
    hasher.update(record.quantity.to_be_bytes());
    hasher.update(record.price_per_unit.to_be_bytes());
    hasher.update(record.total.to_be_bytes());
    hasher.update(record.timestamp.to_be_bytes());
    hasher.finalize().into()
}

impl PurchaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log holding `records` in order, as previously exported.
    pub fn from_records(records: Vec<PurchaseRecord>) -> Self {
        let mut log = Self::new();
        for record in records {
            log.push(record);
        }
        log
    }

    /// Id the next appended record will receive.
    pub fn next_id(&self) -> PurchaseId {
        PurchaseId(self.len() as u64 + 1)
    }

    /// Hash of the newest record, or `ZERO_HASH` for an empty log.
    pub fn head(&self) -> Hash {
        self.last().map(|r| r.record_hash).unwrap_or(ZERO_HASH)
    }

    fn last(&self) -> Option<&PurchaseRecord> {
        self.tail
            .last()
            .or_else(|| self.sealed.last().and_then(|chunk| chunk.last()))
    }

    fn push(&mut self, record: PurchaseRecord) {
        self.tail.push(record);
        if self.tail.len() == CHUNK_LEN {
            let full = std::mem::replace(&mut self.tail, Vec::with_capacity(CHUNK_LEN));
            self.sealed.push(Arc::from(full));
        }
    }

    /// Numbers, chains and appends a purchase.
    pub fn append(&mut self, draft: PurchaseDraft) -> PurchaseId {
        let mut record = PurchaseRecord {
            id: self.next_id(),
            node: draft.node,
            child: draft.child,
            seller: draft.seller,
            buyer: draft.buyer,
            seller_role: draft.seller_role,
            buyer_role: draft.buyer_role,
            quantity: draft.quantity,
            price_per_unit: draft.price_per_unit,
            total: draft.total,
            timestamp: draft.timestamp,
            prev_hash: self.head(),
            record_hash: ZERO_HASH,
        };
        record.record_hash = compute_record_hash(&record);
        let id = record.id;
        self.push(record);
        id
    }

    pub fn get(&self, id: PurchaseId) -> Option<&PurchaseRecord> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        match self.sealed.get(index / CHUNK_LEN) {
            Some(chunk) => chunk.get(index % CHUNK_LEN),
            None => self.tail.get(index - self.sealed.len() * CHUNK_LEN),
        }
    }

    /// All records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &PurchaseRecord> + '_ {
        self.sealed
            .iter()
            .flat_map(|chunk| chunk.iter())
            .chain(self.tail.iter())
    }

    /// Full chunks shared by every clone of this log.
    pub fn sealed_chunks(&self) -> &[Arc<[PurchaseRecord]>] {
        &self.sealed
    }

    /// Records where `participant` bought or sold, oldest first.
    pub fn history_of<'a: 'p, 'p>(
        &'a self,
        participant: &'p Address,
    ) -> impl Iterator<Item = &'a PurchaseRecord> + 'p {
        self.records()
            .filter(move |r| r.buyer == *participant || r.seller == *participant)
    }

    pub fn len(&self) -> usize {
        self.sealed.len() * CHUNK_LEN + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recomputes the chain and reports the first inconsistency.
    pub fn verify(&self) -> Result<(), LogIntegrityError> {
        verify_records(self.records())
    }
}

/// Verifies ordered records as a complete chain.
pub fn verify_records<'a>(
    records: impl IntoIterator<Item = &'a PurchaseRecord>,
) -> Result<(), LogIntegrityError> {
    let mut expected_prev = ZERO_HASH;
    for (position, record) in records.into_iter().enumerate() {
        if record.id.get() != position as u64 + 1 {
            return Err(LogIntegrityError::OutOfSequence {
                position,
                found: record.id,
            });
        }
        if record.prev_hash != expected_prev {
            return Err(LogIntegrityError::BrokenLink {
                purchase: record.id,
                expected: hex::encode(expected_prev),
                found: hex::encode(record.prev_hash),
            });
        }
        if compute_record_hash(record) != record.record_hash {
            return Err(LogIntegrityError::HashMismatch {
                purchase: record.id,
            });
        }
        expected_prev = record.record_hash;
    }
    Ok(())
}
