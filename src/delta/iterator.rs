//! # Delta Iterator
//!
//! Forward-only, batch-at-a-time cursor that overlays visible deltas onto
//! caller-supplied column batches. Driven in lock-step with the base-data
//! scanner, which proceeds in fixed-size batches over increasing row
//! positions.
//!
//! ## Protocol
//!
//! ```text
//! init()                      once, before anything else
//! seek_to_ordinal(row)        position the next batch's start row
//! loop {
//!     prepare_batch(n)        collect visible entries for [cur, cur + n)
//!     apply_updates(col, cb)  once per projected column
//! }
//! ```
//!
//! Calls out of this order fail with an invalid-state error; a failed scan
//! must be abandoned, not retried with the same iterator.
//!
//! ## Batch Advance
//!
//! `prepare_batch` resumes from a remembered `(row, txn)` key rather than
//! re-scanning, relying on the store's ordering invariant. Each entry is
//! therefore visited exactly once across the whole scan, and batch
//! boundaries can never skip or double-apply an update.
//!
//! ## Visibility and Last-Writer-Wins
//!
//! Entries whose transaction is not committed in the bound snapshot are
//! skipped at prepare time; they neither error nor apply. Prepared entries
//! stay in `(row, txn)` ascending order, so applying them forward makes the
//! highest visible transaction's value win per cell.
//!
//! ## Polymorphic Delta Sources
//!
//! [`DeltaIterator`] is the capability interface the surrounding scanner
//! dispatches through; [`DmsIterator`] is the in-memory implementation.
//! On-disk delta-file iterators (out of scope here) implement the same
//! contract.

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

use super::changelist::RowChangeListDecoder;
use super::memstore::{DeltaKey, DeltaMemStore};
use crate::columns::{ColumnBlock, Projection};
use crate::memory::ArenaRef;
use crate::mvcc::MvccSnapshot;

/// Capability interface over one delta source bound to one snapshot.
pub trait DeltaIterator {
    /// Prepares internal decoding state. Must be the first call.
    fn init(&mut self) -> Result<()>;

    /// Positions the cursor so the next prepared batch starts at
    /// `row_idx`.
    ///
    /// Valid any time after `init`. Seeking while a batch is prepared
    /// abandons that batch's collected entries without applying them; the
    /// scan restarts cleanly at the new ordinal.
    fn seek_to_ordinal(&mut self, row_idx: u32) -> Result<()>;

    /// Collects every visible entry in the next `n_rows` rows and advances
    /// the cursor past them.
    fn prepare_batch(&mut self, n_rows: usize) -> Result<()>;

    /// Applies the prepared batch's changes for one projected column onto
    /// `block`, in increasing-transaction order per row.
    fn apply_updates(&mut self, proj_col_idx: usize, block: &mut ColumnBlock) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    NotInitted,
    Ready,
    Prepared,
}

struct PreparedDelta {
    key: DeltaKey,
    stored: ArenaRef,
}

/// [`DeltaIterator`] over a [`DeltaMemStore`]. Borrows the store for the
/// life of the scan; concurrent writers are unaffected.
pub struct DmsIterator<'a> {
    dms: &'a DeltaMemStore,
    projection: Projection,
    snapshot: MvccSnapshot,
    state: IterState,
    // Start row of the next batch to prepare.
    cur_row: u32,
    // Start row and length of the currently prepared batch.
    batch_start: u32,
    batch_rows: usize,
    // First (row, txn) key not yet consumed from the store.
    next_key: DeltaKey,
    prepared: SmallVec<[PreparedDelta; 16]>,
}

impl<'a> DmsIterator<'a> {
    pub(crate) fn new(dms: &'a DeltaMemStore, projection: Projection, snapshot: MvccSnapshot) -> Self {
        Self {
            dms,
            projection,
            snapshot,
            state: IterState::NotInitted,
            cur_row: 0,
            batch_start: 0,
            batch_rows: 0,
            next_key: DeltaKey::new(0, 0),
            prepared: SmallVec::new(),
        }
    }
}

impl DeltaIterator for DmsIterator<'_> {
    fn init(&mut self) -> Result<()> {
        match self.state {
            IterState::NotInitted | IterState::Ready => {
                self.state = IterState::Ready;
                Ok(())
            }
            IterState::Prepared => bail!("invalid iterator state: init after prepare_batch"),
        }
    }

    fn seek_to_ordinal(&mut self, row_idx: u32) -> Result<()> {
        ensure!(
            self.state != IterState::NotInitted,
            "invalid iterator state: seek_to_ordinal before init"
        );
        self.cur_row = row_idx;
        self.next_key = DeltaKey::new(row_idx, 0);
        self.prepared.clear();
        self.state = IterState::Ready;
        Ok(())
    }

    fn prepare_batch(&mut self, n_rows: usize) -> Result<()> {
        ensure!(
            self.state != IterState::NotInitted,
            "invalid iterator state: prepare_batch before init"
        );
        ensure!(n_rows > 0, "prepare_batch of zero rows");
        let end_row = match self.cur_row.checked_add(n_rows as u32) {
            Some(end) => end,
            None => u32::MAX,
        };

        self.batch_start = self.cur_row;
        self.batch_rows = n_rows;
        self.prepared.clear();

        let snapshot = &self.snapshot;
        let prepared = &mut self.prepared;
        self.next_key = self.dms.collect_range(self.next_key, end_row, &mut |key, stored| {
            if snapshot.is_committed(key.txn_id) {
                prepared.push(PreparedDelta { key, stored });
            }
        });

        self.cur_row = end_row;
        self.state = IterState::Prepared;
        Ok(())
    }

    fn apply_updates(&mut self, proj_col_idx: usize, block: &mut ColumnBlock) -> Result<()> {
        ensure!(
            self.state == IterState::Prepared,
            "invalid iterator state: apply_updates without a prepared batch"
        );
        let target_col = match self.projection.base_index(proj_col_idx) {
            Some(idx) => idx,
            None => bail!(
                "column index {} out of range for projection of {} columns",
                proj_col_idx,
                self.projection.column_count()
            ),
        };
        ensure!(
            block.n_rows() == self.batch_rows,
            "column block of {} rows does not match prepared batch of {} rows",
            block.n_rows(),
            self.batch_rows
        );
        debug_assert_eq!(
            block.data_type(),
            self.projection.column(proj_col_idx).map(|c| c.data_type).unwrap(),
            "column block type does not match projected column"
        );

        // Prepared entries are in (row, txn) ascending order, so forward
        // application realizes last-writer-wins per cell.
        for entry in &self.prepared {
            let change = self.dms.changelist_bytes(entry.stored);
            let mut decoder = RowChangeListDecoder::new(self.dms.schema(), change)?;
            if decoder.is_delete() {
                // Row tombstones carry no column data; selection-vector
                // handling belongs to the surrounding scanner.
                continue;
            }
            let offset = (entry.key.row_idx - self.batch_start) as usize;
            while let Some(decoded) = decoder.next_change()? {
                if decoded.column_idx == target_col {
                    block.set_from_raw(offset, decoded.value)?;
                }
            }
        }
        Ok(())
    }
}
