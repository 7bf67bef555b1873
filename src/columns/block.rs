//! # Column Block
//!
//! A `ColumnBlock` is the caller-supplied, column-major buffer for one
//! column over one scan batch. The surrounding scanner fills it with base
//! data, then hands it to a delta iterator which overwrites only the cells
//! that have visible deltas; untouched cells keep their base values.
//!
//! ## Ownership
//!
//! The block owns its cell storage. Variable-width values written through
//! `set_from_raw` are copied into block-owned buffers, so the delta store's
//! arena can be reclaimed independently of any blocks read from it.

use eyre::{bail, ensure, Result};

use super::schema::DataType;

#[derive(Debug)]
enum ColumnData {
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Int64(Vec<i64>),
    Binary(Vec<Vec<u8>>),
}

/// Column-major cell buffer for one column of one scan batch.
#[derive(Debug)]
pub struct ColumnBlock {
    data: ColumnData,
}

impl ColumnBlock {
    /// Creates a zero-filled block of `n_rows` cells.
    pub fn new(data_type: DataType, n_rows: usize) -> Self {
        let data = match data_type {
            DataType::UInt32 => ColumnData::UInt32(vec![0; n_rows]),
            DataType::UInt64 => ColumnData::UInt64(vec![0; n_rows]),
            DataType::Int64 => ColumnData::Int64(vec![0; n_rows]),
            DataType::String => ColumnData::Binary(vec![Vec::new(); n_rows]),
        };
        Self { data }
    }

    pub fn n_rows(&self) -> usize {
        match &self.data {
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Binary(v) => v.len(),
        }
    }

    pub fn data_type(&self) -> DataType {
        match &self.data {
            ColumnData::UInt32(_) => DataType::UInt32,
            ColumnData::UInt64(_) => DataType::UInt64,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Binary(_) => DataType::String,
        }
    }

    /// Writes one cell from its wire encoding: little-endian bytes of the
    /// column's fixed width, or the raw payload for variable-width columns
    /// (copied into block-owned storage).
    pub fn set_from_raw(&mut self, row: usize, raw: &[u8]) -> Result<()> {
        ensure!(
            row < self.n_rows(),
            "row offset {} out of range for block of {} rows",
            row,
            self.n_rows()
        );
        match &mut self.data {
            ColumnData::UInt32(v) => {
                ensure!(raw.len() == 4, "expected 4-byte uint32 cell, got {} bytes", raw.len());
                v[row] = u32::from_le_bytes(raw.try_into()?);
            }
            ColumnData::UInt64(v) => {
                ensure!(raw.len() == 8, "expected 8-byte uint64 cell, got {} bytes", raw.len());
                v[row] = u64::from_le_bytes(raw.try_into()?);
            }
            ColumnData::Int64(v) => {
                ensure!(raw.len() == 8, "expected 8-byte int64 cell, got {} bytes", raw.len());
                v[row] = i64::from_le_bytes(raw.try_into()?);
            }
            ColumnData::Binary(v) => {
                v[row].clear();
                v[row].extend_from_slice(raw);
            }
        }
        Ok(())
    }

    pub fn set_u32(&mut self, row: usize, val: u32) {
        match &mut self.data {
            ColumnData::UInt32(v) => v[row] = val,
            _ => panic!("set_u32 on non-uint32 block"),
        }
    }

    pub fn u32_at(&self, row: usize) -> u32 {
        match &self.data {
            ColumnData::UInt32(v) => v[row],
            _ => panic!("u32_at on non-uint32 block"),
        }
    }

    pub fn set_u64(&mut self, row: usize, val: u64) {
        match &mut self.data {
            ColumnData::UInt64(v) => v[row] = val,
            _ => panic!("set_u64 on non-uint64 block"),
        }
    }

    pub fn u64_at(&self, row: usize) -> u64 {
        match &self.data {
            ColumnData::UInt64(v) => v[row],
            _ => panic!("u64_at on non-uint64 block"),
        }
    }

    pub fn set_i64(&mut self, row: usize, val: i64) {
        match &mut self.data {
            ColumnData::Int64(v) => v[row] = val,
            _ => panic!("set_i64 on non-int64 block"),
        }
    }

    pub fn i64_at(&self, row: usize) -> i64 {
        match &self.data {
            ColumnData::Int64(v) => v[row],
            _ => panic!("i64_at on non-int64 block"),
        }
    }

    pub fn set_binary(&mut self, row: usize, val: &[u8]) {
        match &mut self.data {
            ColumnData::Binary(v) => {
                v[row].clear();
                v[row].extend_from_slice(val);
            }
            _ => panic!("set_binary on non-string block"),
        }
    }

    pub fn binary_at(&self, row: usize) -> &[u8] {
        match &self.data {
            ColumnData::Binary(v) => &v[row],
            _ => panic!("binary_at on non-string block"),
        }
    }

    /// Fills every cell with a marker value. Used to seed a batch so tests
    /// can tell updated cells from untouched ones.
    pub fn fill_u32(&mut self, marker: u32) -> Result<()> {
        match &mut self.data {
            ColumnData::UInt32(v) => {
                v.fill(marker);
                Ok(())
            }
            _ => bail!("fill_u32 on non-uint32 block"),
        }
    }
}
