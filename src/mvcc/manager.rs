//! # Transaction Manager
//!
//! Per-segment coordinator that issues transaction IDs, tracks the
//! in-flight set, and captures [`MvccSnapshot`]s.
//!
//! ## State Layout
//!
//! ```text
//! MvccManager {
//!     state: Mutex<MvccState {
//!         next_txn_id: TxnId,           // next ID to issue
//!         txns_in_flight: BTreeSet,     // started, not yet committed
//!     }>
//! }
//! ```
//!
//! The ordered in-flight set keeps snapshot capture O(in-flight): the
//! smallest in-flight ID is the dense-committed bound, and the committed
//! tail is every non-in-flight ID between that bound and `next_txn_id`.
//!
//! ## Caller Contract
//!
//! `commit_transaction` must be called exactly once per started ID.
//! Committing an unknown or already-committed ID is a programming error:
//! fatal in debug builds, a guarded no-op in release.

use hashbrown::HashSet;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::trace;

use super::snapshot::MvccSnapshot;
use super::TxnId;

struct MvccState {
    next_txn_id: TxnId,
    txns_in_flight: BTreeSet<TxnId>,
}

/// Issues transaction IDs, tracks in-flight transactions, and answers
/// snapshot queries. One per tablet segment, injected into writers and
/// readers; lives and dies with the segment.
pub struct MvccManager {
    state: Mutex<MvccState>,
}

impl MvccManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MvccState {
                next_txn_id: 1,
                txns_in_flight: BTreeSet::new(),
            }),
        }
    }

    /// Allocates the next transaction ID and records it as in-flight.
    /// Never blocks beyond the internal lock.
    pub fn start_transaction(&self) -> TxnId {
        let mut state = self.state.lock();
        let txid = state.next_txn_id;
        state.next_txn_id += 1;
        state.txns_in_flight.insert(txid);
        trace!(txid, "start transaction");
        txid
    }

    /// Marks `txid` committed, making it visible to snapshots captured from
    /// now on. Exactly-once per transaction; double commit or commit of an
    /// unknown ID is debug-fatal.
    pub fn commit_transaction(&self, txid: TxnId) {
        let mut state = self.state.lock();
        let was_in_flight = state.txns_in_flight.remove(&txid);
        debug_assert!(
            was_in_flight,
            "commit of unknown or already-committed transaction {}",
            txid
        );
        trace!(txid, "commit transaction");
    }

    /// Captures the current in-flight set as an immutable snapshot.
    pub fn take_snapshot(&self) -> MvccSnapshot {
        let state = self.state.lock();
        let bound = state
            .txns_in_flight
            .iter()
            .next()
            .copied()
            .unwrap_or(state.next_txn_id);
        let committed: HashSet<TxnId> = (bound..state.next_txn_id)
            .filter(|id| !state.txns_in_flight.contains(id))
            .collect();
        MvccSnapshot::new(bound, committed)
    }
}

impl Default for MvccManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped transaction handle: starts a transaction on construction and
/// commits it on drop, on every exit path. Exactly-once commit regardless
/// of control flow; there is no abort path.
pub struct ScopedTransaction<'a> {
    manager: &'a MvccManager,
    txid: TxnId,
    committed: bool,
}

impl<'a> ScopedTransaction<'a> {
    pub fn new(manager: &'a MvccManager) -> Self {
        Self {
            manager,
            txid: manager.start_transaction(),
            committed: false,
        }
    }

    /// The held transaction ID, used as the txn component of delta keys.
    pub fn txid(&self) -> TxnId {
        self.txid
    }

    /// Commits now instead of at end of scope.
    pub fn commit(mut self) {
        self.manager.commit_transaction(self.txid);
        self.committed = true;
    }
}

impl Drop for ScopedTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.manager.commit_transaction(self.txid);
        }
    }
}
