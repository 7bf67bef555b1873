//! # Delta Memstore Integration Tests
//!
//! End-to-end tests driving the public API the way the surrounding tablet
//! scanner would: encode changes under scoped transactions, insert them
//! into a delta memstore, then overlay them onto column batches through a
//! delta iterator bound to an MVCC snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use coldelta::{
    CellValue, ColumnBlock, ColumnSchema, DataType, DeltaIterator, DeltaMemStore, MvccManager,
    MvccSnapshot, Projection, RowChangeListEncoder, Schema, ScopedTransaction,
};

const MARKER: u32 = 0xDEADBEEF;

fn generate_random_indexes(range: u32, count: usize) -> HashSet<u32> {
    assert!(
        count <= (range / 2) as usize,
        "this will be too slow unless count is much smaller than range"
    );
    let mut rng = StdRng::seed_from_u64(12345);
    let mut out = HashSet::new();
    while out.len() < count {
        out.insert(rng.gen_range(0..range));
    }
    out
}

/// Opens a fresh single-column iterator over `dms` and applies every delta
/// in `[start_row, start_row + block rows)` visible under `snapshot` onto
/// `block`.
fn apply_updates(
    dms: &Arc<DeltaMemStore>,
    snapshot: &MvccSnapshot,
    start_row: u32,
    col_idx: usize,
    block: &mut ColumnBlock,
) {
    let proj = Projection::new(dms.schema(), &[col_idx]).unwrap();
    let mut iter = dms.new_delta_iterator(proj, snapshot.clone());
    iter.init().unwrap();
    iter.seek_to_ordinal(start_row).unwrap();
    iter.prepare_batch(block.n_rows()).unwrap();
    iter.apply_updates(0, block).unwrap();
}

#[test]
fn sparse_updates_touch_only_updated_rows() {
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    let n_rows = 1000u32;
    let indexes_to_update = generate_random_indexes(n_rows, 100);
    for &row in &indexes_to_update {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(0, CellValue::UInt32(row)).unwrap();
        dms.update(tx.txid(), row, enc.as_changelist()).unwrap();
    }
    assert_eq!(dms.count(), 100);

    let mut read_back = ColumnBlock::new(DataType::UInt32, n_rows as usize);
    read_back.fill_u32(MARKER).unwrap();
    let snap = mvcc.take_snapshot();
    apply_updates(&dms, &snap, 0, 0, &mut read_back);

    for row in 0..n_rows {
        if indexes_to_update.contains(&row) {
            assert_eq!(read_back.u32_at(row as usize), row, "updated row {}", row);
        } else {
            assert_eq!(read_back.u32_at(row as usize), MARKER, "untouched row {}", row);
        }
    }
}

#[test]
fn re_update_of_string_cell_keeps_both_snapshots_readable() {
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::String)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    // Update a cell, then clobber the source buffer after the call. The
    // store must have copied the payload into its own arena.
    {
        let tx = ScopedTransaction::new(&mvcc);
        let mut buf = b"update 1".to_vec();
        enc.add_column_update(0, CellValue::Slice(&buf)).unwrap();
        dms.update(tx.txid(), 123, enc.as_changelist()).unwrap();
        buf.fill(0xFF);
    }
    let snapshot_after_first_update = mvcc.take_snapshot();

    // Update the same cell again under a new transaction.
    {
        let tx = ScopedTransaction::new(&mvcc);
        let mut buf = b"update 2".to_vec();
        enc.reset();
        enc.add_column_update(0, CellValue::Slice(&buf)).unwrap();
        dms.update(tx.txid(), 123, enc.as_changelist()).unwrap();
        buf.fill(0xFF);
    }
    let snapshot_after_second_update = mvcc.take_snapshot();

    // Two entries for the cell, one per transaction.
    assert_eq!(dms.count(), 2);

    let mut read_back = ColumnBlock::new(DataType::String, 1);
    apply_updates(&dms, &snapshot_after_first_update, 123, 0, &mut read_back);
    assert_eq!(read_back.binary_at(0), b"update 1");

    apply_updates(&dms, &snapshot_after_second_update, 123, 0, &mut read_back);
    assert_eq!(read_back.binary_at(0), b"update 2");
}

#[test]
fn multi_column_updates_and_additive_re_update() {
    let schema = Schema::new(vec![
        ColumnSchema::new("col1", DataType::String),
        ColumnSchema::new("col2", DataType::String),
        ColumnSchema::new("col3", DataType::UInt32),
    ]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    for i in 0..1000u32 {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(2, CellValue::UInt32(i * 10)).unwrap();
        let text = format!("hello {}", i);
        enc.add_column_update(0, CellValue::Slice(text.as_bytes())).unwrap();
        dms.update(tx.txid(), i, enc.as_changelist()).unwrap();
    }
    assert_eq!(dms.count(), 1000);

    let snap = mvcc.take_snapshot();
    let mut read_back = ColumnBlock::new(DataType::UInt32, 1000);
    let mut read_back_strings = ColumnBlock::new(DataType::String, 1000);
    apply_updates(&dms, &snap, 0, 2, &mut read_back);
    apply_updates(&dms, &snap, 0, 0, &mut read_back_strings);

    for i in 0..1000u32 {
        assert_eq!(read_back.u32_at(i as usize), i * 10, "failed at row {}", i);
        let expected = format!("hello {}", i);
        assert_eq!(read_back_strings.binary_at(i as usize), expected.as_bytes());
    }

    // Update the same rows again under new transactions. Even though the
    // rows repeat, new entries must be added; the old ones stay reachable
    // for snapshot consistency.
    for i in 0..1000u32 {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(2, CellValue::UInt32(i * 20)).unwrap();
        dms.update(tx.txid(), i, enc.as_changelist()).unwrap();
    }
    assert_eq!(dms.count(), 2000);
}

#[test]
fn iterator_applies_batches_from_arbitrary_offset() {
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    for i in 0..1000u32 {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(0, CellValue::UInt32(i * 10)).unwrap();
        dms.update(tx.txid(), i, enc.as_changelist()).unwrap();
    }
    assert_eq!(dms.count(), 1000);

    let snap = mvcc.take_snapshot();
    let proj = Projection::all(&schema);
    let mut iter = dms.new_delta_iterator(proj, snap);
    iter.init().unwrap();

    let mut block_start_row = 50u32;
    iter.seek_to_ordinal(block_start_row).unwrap();

    let mut block = ColumnBlock::new(DataType::UInt32, 100);
    iter.prepare_batch(block.n_rows()).unwrap();
    iter.apply_updates(0, &mut block).unwrap();
    for i in 0..100u32 {
        assert_eq!(block.u32_at(i as usize), (block_start_row + i) * 10);
    }

    // The next batch continues where the previous one left off; no seek.
    block_start_row += block.n_rows() as u32;
    iter.prepare_batch(block.n_rows()).unwrap();
    iter.apply_updates(0, &mut block).unwrap();
    for i in 0..100u32 {
        assert_eq!(block.u32_at(i as usize), (block_start_row + i) * 10);
    }
}

#[test]
fn batched_iteration_matches_single_batch_iteration() {
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    for i in 0..1000u32 {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(0, CellValue::UInt32(i + 1)).unwrap();
        dms.update(tx.txid(), i, enc.as_changelist()).unwrap();
    }
    let snap = mvcc.take_snapshot();

    // One 1000-row batch.
    let mut whole = ColumnBlock::new(DataType::UInt32, 1000);
    whole.fill_u32(MARKER).unwrap();
    apply_updates(&dms, &snap, 0, 0, &mut whole);

    // Ten 100-row batches through one iterator.
    let proj = Projection::all(&schema);
    let mut iter = dms.new_delta_iterator(proj, snap);
    iter.init().unwrap();
    iter.seek_to_ordinal(0).unwrap();
    let mut batched = Vec::with_capacity(1000);
    for _ in 0..10 {
        let mut block = ColumnBlock::new(DataType::UInt32, 100);
        block.fill_u32(MARKER).unwrap();
        iter.prepare_batch(100).unwrap();
        iter.apply_updates(0, &mut block).unwrap();
        for i in 0..100 {
            batched.push(block.u32_at(i));
        }
    }

    for row in 0..1000 {
        assert_eq!(whole.u32_at(row), batched[row], "row {}", row);
    }
}

#[test]
fn snapshot_ordering_reads_old_then_new_value() {
    // Concrete scenario: one uint32 column, row 0 updated to 0 under txn 1
    // and to 10 under txn 2. S1 (after txn 1 commits, before txn 2 starts)
    // reads 0; S2 (after both commit) reads 10.
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    {
        let tx = ScopedTransaction::new(&mvcc);
        assert_eq!(tx.txid(), 1);
        enc.add_column_update(0, CellValue::UInt32(0)).unwrap();
        dms.update(tx.txid(), 0, enc.as_changelist()).unwrap();
    }
    let s1 = mvcc.take_snapshot();

    {
        let tx = ScopedTransaction::new(&mvcc);
        assert_eq!(tx.txid(), 2);
        enc.reset();
        enc.add_column_update(0, CellValue::UInt32(10)).unwrap();
        dms.update(tx.txid(), 0, enc.as_changelist()).unwrap();
    }
    let s2 = mvcc.take_snapshot();

    let mut block = ColumnBlock::new(DataType::UInt32, 1);
    block.fill_u32(MARKER).unwrap();
    apply_updates(&dms, &s1, 0, 0, &mut block);
    assert_eq!(block.u32_at(0), 0);

    apply_updates(&dms, &s2, 0, 0, &mut block);
    assert_eq!(block.u32_at(0), 10);
}

#[test]
fn last_writer_wins_within_one_batch() {
    let schema = Schema::new(vec![ColumnSchema::new("col1", DataType::UInt32)]);
    let dms = Arc::new(DeltaMemStore::new(schema.clone()));
    let mvcc = MvccManager::new();
    let mut enc = RowChangeListEncoder::new(&schema);

    // Three committed revisions of the same cell; the highest transaction
    // ID must determine the applied value.
    for val in [1u32, 2, 3] {
        let tx = ScopedTransaction::new(&mvcc);
        enc.reset();
        enc.add_column_update(0, CellValue::UInt32(val)).unwrap();
        dms.update(tx.txid(), 5, enc.as_changelist()).unwrap();
    }
    assert_eq!(dms.count(), 3);

    let snap = mvcc.take_snapshot();
    let mut block = ColumnBlock::new(DataType::UInt32, 10);
    block.fill_u32(MARKER).unwrap();
    apply_updates(&dms, &snap, 0, 0, &mut block);
    assert_eq!(block.u32_at(5), 3);
}
