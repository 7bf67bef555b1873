//! # ColDelta - Mutable-Update Core for Columnar Storage
//!
//! ColDelta is the in-memory mutable-update core of a column-oriented storage
//! engine: a per-tablet-segment structure that records in-place row
//! modifications (column updates and row deletes) without touching immutable
//! base data, and makes those modifications visible to readers under snapshot
//! isolation. This crate prioritizes:
//!
//! - **Append-only delta accumulation**: entries are inserted, never mutated
//!   or removed, so historical snapshots stay valid for the life of the store
//! - **Copy-in ownership**: encoded changes are copied into a store-owned
//!   arena at insert time, so caller buffers can be reused immediately
//! - **Lock-step batch merge**: a forward-only iterator overlays visible
//!   deltas onto caller-supplied column batches without re-scanning entries
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use coldelta::{
//!     CellValue, ColumnBlock, ColumnSchema, DataType, DeltaIterator,
//!     DeltaMemStore, MvccManager, Projection, RowChangeListEncoder, Schema,
//!     ScopedTransaction,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
//! let dms = Arc::new(DeltaMemStore::new(schema.clone()));
//! let mvcc = MvccManager::new();
//!
//! // Writer: update row 42 inside a scoped transaction.
//! let mut enc = RowChangeListEncoder::new(&schema);
//! {
//!     let tx = ScopedTransaction::new(&mvcc);
//!     enc.add_column_update(0, CellValue::UInt32(7))?;
//!     dms.update(tx.txid(), 42, enc.as_changelist())?;
//! }
//!
//! // Reader: overlay visible deltas onto a base-data batch.
//! let snap = mvcc.take_snapshot();
//! let proj = Projection::new(&schema, &[0])?;
//! let mut iter = dms.new_delta_iterator(proj, snap);
//! let mut block = ColumnBlock::new(DataType::UInt32, 100);
//! iter.init()?;
//! iter.seek_to_ordinal(0)?;
//! iter.prepare_batch(100)?;
//! iter.apply_updates(0, &mut block)?;
//! assert_eq!(block.u32_at(42), 7);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        Tablet Scanner (out of scope)          │
//! ├──────────────────────────────────────────────┤
//! │  MVCC (MvccManager / ScopedTransaction /      │
//! │        MvccSnapshot)                          │
//! ├──────────────────────────────────────────────┤
//! │  DeltaMemStore  ──>  DmsIterator              │
//! │  (ordered entries)   (scan-time merge)        │
//! ├──────────────────────────────────────────────┤
//! │  RowChangeList codec (varint wire format)     │
//! ├──────────────────────────────────────────────┤
//! │  Arena (bump allocation, copy-in ownership)   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Control Flow
//!
//! A writer starts a transaction ([`MvccManager`] -> [`ScopedTransaction`]),
//! encodes a change ([`RowChangeListEncoder`]), inserts it into the
//! [`DeltaMemStore`] keyed by `(row, txn)`, then commits when the scoped
//! transaction drops. A reader captures an [`MvccSnapshot`], opens a
//! [`DmsIterator`] restricted to a column [`Projection`], and for every batch
//! of base rows asks the iterator to overlay visible updates onto the batch's
//! [`ColumnBlock`]s.
//!
//! ## Module Overview
//!
//! - [`columns`]: Schemas, column projections, and batch column buffers
//! - [`encoding`]: Varint encoding for the changelist wire format
//! - [`memory`]: Bump-allocation arena with copy-in ownership
//! - [`mvcc`]: Transaction IDs, snapshots, and scoped commit guards
//! - [`delta`]: Changelist codec, delta memstore, and the scan-time merge
//!   iterator

pub mod columns;
pub mod delta;
pub mod encoding;
pub mod memory;
pub mod mvcc;

pub use columns::{CellValue, ColumnBlock, ColumnSchema, DataType, Projection, Schema};
pub use delta::{
    DeltaIterator, DeltaKey, DeltaMemStore, DmsIterator, RowChangeList, RowChangeListDecoder,
    RowChangeListEncoder,
};
pub use memory::Arena;
pub use mvcc::{MvccManager, MvccSnapshot, ScopedTransaction, TxnId};
