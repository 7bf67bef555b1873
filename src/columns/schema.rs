//! # Schema Definition
//!
//! This module provides the `Schema` struct describing the column layout of a
//! tablet segment, and `Projection`, the subset of columns a scan cares about.
//! The schema pre-computes per-column byte offsets for O(1) access.
//!
//! ## Fixed vs Variable Width
//!
//! | Type   | Width (bytes) | Cell encoding            |
//! |--------|---------------|--------------------------|
//! | uint32 | 4             | little-endian            |
//! | uint64 | 8             | little-endian            |
//! | int64  | 8             | little-endian            |
//! | string | variable      | length-prefixed payload  |
//!
//! Variable-width values are always copied into owner-controlled storage
//! (the delta store's arena on write, the column block on read); they are
//! never aliased out of a caller's buffer.

use eyre::{ensure, Result};

/// Column data types supported by the delta core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    UInt32,
    UInt64,
    Int64,
    String,
}

impl DataType {
    /// Returns the fixed byte width of the type, or `None` for
    /// variable-width types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::UInt32 => Some(4),
            DataType::UInt64 | DataType::Int64 => Some(8),
            DataType::String => None,
        }
    }

    pub fn is_var_len(&self) -> bool {
        self.fixed_size().is_none()
    }
}

/// One column: a name plus its data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Immutable column layout for one tablet segment.
///
/// Pre-computes fixed byte offsets so the codec and iterator can resolve
/// value widths without re-walking the column list.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    fixed_offsets: Vec<usize>,
    row_byte_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        let mut fixed_offsets = Vec::with_capacity(columns.len());
        let mut offset = 0;
        for col in &columns {
            fixed_offsets.push(offset);
            // Variable-width columns occupy a pointer-sized reference slot
            // in the row layout.
            offset += col.data_type.fixed_size().unwrap_or(std::mem::size_of::<usize>());
        }
        Self {
            columns,
            fixed_offsets,
            row_byte_size: offset,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnSchema> {
        self.columns.get(idx)
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn fixed_offset(&self, idx: usize) -> usize {
        self.fixed_offsets[idx]
    }

    /// Byte size of one row in the segment's row layout.
    pub fn row_byte_size(&self) -> usize {
        self.row_byte_size
    }
}

/// A subset of a schema's columns, remembering each projected column's index
/// in the base schema.
///
/// The delta iterator is created against a projection; `apply_updates` takes
/// projection-relative column indices and uses `base_index` to match decoded
/// changes (which carry base-schema indices) against the target column.
#[derive(Debug, Clone)]
pub struct Projection {
    columns: Vec<ColumnSchema>,
    base_indices: Vec<usize>,
}

impl Projection {
    pub fn new(base: &Schema, col_indices: &[usize]) -> Result<Self> {
        let mut columns = Vec::with_capacity(col_indices.len());
        for &idx in col_indices {
            ensure!(
                idx < base.column_count(),
                "column index {} out of range for schema with {} columns",
                idx,
                base.column_count()
            );
            columns.push(base.columns[idx].clone());
        }
        Ok(Self {
            columns,
            base_indices: col_indices.to_vec(),
        })
    }

    /// Projects every column of the base schema, in order.
    pub fn all(base: &Schema) -> Self {
        Self {
            columns: base.columns.clone(),
            base_indices: (0..base.column_count()).collect(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, proj_idx: usize) -> Option<&ColumnSchema> {
        self.columns.get(proj_idx)
    }

    /// Maps a projection-relative column index to its base-schema index.
    pub fn base_index(&self, proj_idx: usize) -> Option<usize> {
        self.base_indices.get(proj_idx).copied()
    }
}

/// A typed cell value handed to the changelist encoder.
///
/// Borrowed variable-width payloads are copied at encode time; the caller's
/// buffer may be reused as soon as the encoder call returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    UInt32(u32),
    UInt64(u64),
    Int64(i64),
    Slice(&'a [u8]),
}

impl<'a> CellValue<'a> {
    /// Returns true if this value's type matches the given column type.
    pub fn matches(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (CellValue::UInt32(_), DataType::UInt32)
                | (CellValue::UInt64(_), DataType::UInt64)
                | (CellValue::Int64(_), DataType::Int64)
                | (CellValue::Slice(_), DataType::String)
        )
    }
}
