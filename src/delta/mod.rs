//! # Delta Module
//!
//! The mutable-update path of the storage engine:
//!
//! - **RowChangeList codec**: compact binary encoding of a sparse set of
//!   column updates, or a row-delete marker
//! - **DeltaMemStore**: concurrent, ordered, append-only store of encoded
//!   deltas keyed by `(row, txn)`
//! - **DeltaIterator**: forward-only cursor that overlays visible deltas
//!   onto column batches during a scan
//!
//! ## Data Flow
//!
//! ```text
//! writer                              reader
//! ------                              ------
//! ScopedTransaction::new(&mvcc)       snap = mvcc.take_snapshot()
//! enc.add_column_update(..)           iter = dms.new_delta_iterator(proj, snap)
//! dms.update(txid, row, changelist)   iter.init() / seek_to_ordinal(row)
//! (drop guard => commit)              loop: prepare_batch(n)
//!                                           apply_updates(col, block)
//! ```
//!
//! ## Ordering Invariant
//!
//! Entries are stored in `(row_idx, txn_id)` ascending order and are never
//! mutated or removed. The iterator consumes entries in exactly that order,
//! which is what makes last-writer-wins fall out of plain forward
//! application, and what lets batch advance resume from a remembered key
//! instead of re-scanning.

mod changelist;
mod iterator;
mod memstore;

pub use changelist::{DecodedChange, RowChangeList, RowChangeListDecoder, RowChangeListEncoder};
pub use iterator::{DeltaIterator, DmsIterator};
pub use memstore::{DeltaKey, DeltaMemStore};
