//! # In-Memory Ledger Store
//!
//! Copy-on-write store with a single writer.
//!
//! ```text
//! readers ──read lock──→ Arc<LedgerState>  (clone the Arc, release)
//! writer  ──writer mutex──→ clone state ──→ command ──Ok──→ swap Arc
//!                                                └──Err──→ drop copy
//! ```
//!
//! Readers hold the read lock only long enough to clone an `Arc`, so they
//! never wait for a command to run. Commands are serialized by the writer
//! mutex, which makes every check-then-act on quantity or escrow atomic.
//! The state copy shares the sealed chunks of the purchase log with the
//! previous snapshot, so a commit does not copy purchase history.

use crate::ports::LedgerStore;
use crate::state::LedgerState;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, LedgerError};
use std::sync::Arc;

pub struct InMemoryLedgerStore {
    current: RwLock<Arc<LedgerState>>,
    writer: Mutex<()>,
}

impl InMemoryLedgerStore {
    /// Fresh ledger administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self::from_state(LedgerState::genesis(admin))
    }

    /// Store resuming from a previously exported state.
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            current: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
        }
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn snapshot(&self) -> Arc<LedgerState> {
        Arc::clone(&*self.current.read())
    }

    fn transact<T, F>(&self, command: F) -> Result<(T, Arc<LedgerState>), LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<T, LedgerError>,
    {
        let _writer = self.writer.lock();
        let mut next = LedgerState::clone(&self.snapshot());
        next.version += 1;

        let value = command(&mut next)?;

        let committed = Arc::new(next);
        *self.current.write() = Arc::clone(&committed);
        Ok((value, committed))
    }
}
