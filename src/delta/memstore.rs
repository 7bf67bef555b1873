//! # Delta Memstore
//!
//! Concurrent, ordered, append-only accumulation of encoded row changes for
//! one mutable tablet segment. Lives from segment creation until the
//! segment is flushed or compacted (out of scope here).
//!
//! ## Storage Layout
//!
//! ```text
//! DeltaMemStore {
//!     schema:  Schema                       // segment column layout
//!     arena:   Arena                        // owns every encoded change
//!     entries: RwLock<BTreeMap<             // (row, txn) ascending
//!                  DeltaKey -> ArenaRef>>
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Writers insert under the write lock; entries are never mutated or
//!   removed in place, so updates are purely additive
//! - Readers range-scan under the read lock, one batch at a time; a reader
//!   that has advanced past row R is unaffected by a later insert at R
//! - The arena serializes its own allocations, so copy-in happens outside
//!   the entries lock
//!
//! ## Insert-Time Copy
//!
//! `update` copies the whole encoded changelist into the store's arena
//! before inserting, so the caller's encoder buffer may be cleared or
//! reused the moment the call returns. Variable-width payloads travel
//! inline in the encoding, so one copy owns everything.
//!
//! ## Safety Considerations
//!
//! Entries hold [`ArenaRef`] raw-pointer handles into the store's own
//! arena. The store never resets that arena, and both fields live and die
//! together, so reborrowing an entry's bytes at the store's lifetime is
//! sound; `changelist_bytes` is the one safe wrapper around the unsafe
//! reborrow.

use std::collections::BTreeMap;

use eyre::Result;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::changelist::{RowChangeList, RowChangeListDecoder};
use super::iterator::DmsIterator;
use crate::columns::{Projection, Schema};
use crate::memory::{Arena, ArenaRef};
use crate::mvcc::{MvccSnapshot, TxnId};

/// Composite key of one delta entry: row-major, then txn-ascending, so all
/// changes to a row sort together in chronological (commit-order) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeltaKey {
    pub row_idx: u32,
    pub txn_id: TxnId,
}

impl DeltaKey {
    pub fn new(row_idx: u32, txn_id: TxnId) -> Self {
        Self { row_idx, txn_id }
    }
}

/// In-memory, append-only, ordered store of encoded deltas.
pub struct DeltaMemStore {
    schema: Schema,
    arena: Arena,
    entries: RwLock<BTreeMap<DeltaKey, ArenaRef>>,
}

impl DeltaMemStore {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            arena: Arena::new(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Records one row change under `txn_id`. The encoded bytes are copied
    /// into the store's arena; the caller's buffer may be reused
    /// immediately. Changes are purely additive: updating the same row
    /// under a new transaction adds a second entry rather than replacing
    /// the first, so older snapshots keep seeing the prior value.
    pub fn update(&self, txn_id: TxnId, row_idx: u32, change: RowChangeList<'_>) -> Result<()> {
        if cfg!(debug_assertions) {
            RowChangeListDecoder::new(&self.schema, change)?.verify()?;
        }

        let stored = self.arena.alloc_copy(change.as_bytes());
        let key = DeltaKey::new(row_idx, txn_id);
        let prev = self.entries.write().insert(key, stored);
        debug_assert!(
            prev.is_none(),
            "duplicate delta for row {} under transaction {}",
            row_idx,
            txn_id
        );
        trace!(txn_id, row_idx, len = change.as_bytes().len(), "dms update");
        Ok(())
    }

    /// Number of delta entries stored (not distinct rows).
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Bytes held by the store's arena, for memory accounting.
    pub fn arena_bytes(&self) -> usize {
        self.arena.bytes_allocated()
    }

    /// Opens a scan cursor restricted to `projection`, observing exactly
    /// the transactions `snapshot` considers committed. Entries inserted
    /// before this call are always observed; later inserts may or may not
    /// be.
    pub fn new_delta_iterator(&self, projection: Projection, snapshot: MvccSnapshot) -> DmsIterator<'_> {
        debug!(entries = self.count(), "open dms iterator");
        DmsIterator::new(self, projection, snapshot)
    }

    /// Collects the entries in `[start_row, end_row)` at or after
    /// `resume_key`, in `(row, txn)` ascending order. Returns the key to
    /// resume from on the next batch.
    pub(crate) fn collect_range(
        &self,
        resume_key: DeltaKey,
        end_row: u32,
        out: &mut dyn FnMut(DeltaKey, ArenaRef),
    ) -> DeltaKey {
        let entries = self.entries.read();
        let mut next = resume_key;
        for (&key, &stored) in entries.range(resume_key..) {
            if key.row_idx >= end_row {
                break;
            }
            out(key, stored);
            next = DeltaKey::new(key.row_idx, key.txn_id + 1);
        }
        // Never resume before the end of the batch's row range.
        next.max(DeltaKey::new(end_row, 0))
    }

    /// Reborrows one entry's encoded bytes at the store's lifetime.
    pub(crate) fn changelist_bytes(&self, stored: ArenaRef) -> RowChangeList<'_> {
        // SAFETY: `stored` was allocated from `self.arena`, which is never
        // reset and outlives every borrow of `self`.
        RowChangeList::new(unsafe { stored.as_slice() })
    }
}

impl std::fmt::Debug for DeltaMemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaMemStore")
            .field("entries", &self.count())
            .field("arena_bytes", &self.arena_bytes())
            .finish()
    }
}
