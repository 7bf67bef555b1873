//! # MVCC Snapshot
//!
//! An immutable visibility predicate over transaction IDs, captured at a
//! point in time by [`MvccManager::take_snapshot`].
//!
//! ## Representation
//!
//! Rather than a full set of every committed ID, the snapshot stores a
//! dense lower region plus an explicit tail:
//!
//! - `all_committed_before`: every issued ID strictly below this bound was
//!   committed at capture time (the smallest in-flight ID, or the next ID
//!   to issue when nothing was in flight); the reserved ID 0 is excluded
//! - `committed`: the IDs at or above the bound that had already committed
//!   (transactions that started later but finished before an earlier one)
//!
//! With no concurrent transactions in flight the tail set is empty and the
//! snapshot degenerates to a simple upper bound.
//!
//! [`MvccManager::take_snapshot`]: super::manager::MvccManager::take_snapshot

use hashbrown::HashSet;

use super::TxnId;

/// Immutable point-in-time visibility predicate over transaction IDs.
#[derive(Debug, Clone)]
pub struct MvccSnapshot {
    all_committed_before: TxnId,
    committed: HashSet<TxnId>,
}

impl MvccSnapshot {
    pub(crate) fn new(all_committed_before: TxnId, committed: HashSet<TxnId>) -> Self {
        debug_assert!(
            committed.iter().all(|&id| id >= all_committed_before),
            "committed tail overlaps the dense region"
        );
        Self {
            all_committed_before,
            committed,
        }
    }

    /// A snapshot in which every issued ID below `bound` is committed and
    /// nothing else is. Useful for tests and for scans over fully-flushed
    /// data.
    pub fn all_committed_before(bound: TxnId) -> Self {
        Self::new(bound, HashSet::new())
    }

    /// Returns true iff `txn_id`'s writes are visible in this snapshot.
    ///
    /// ID 0 is reserved and never issued, so it is never committed, even
    /// though it sits below every dense bound.
    pub fn is_committed(&self, txn_id: TxnId) -> bool {
        txn_id != 0 && (txn_id < self.all_committed_before || self.committed.contains(&txn_id))
    }
}
