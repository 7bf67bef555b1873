//! # Row Changelist Codec
//!
//! Compact binary encoding for a partial-row change: a sparse set of
//! `(column index, new value)` pairs, or a marker deleting the whole row.
//!
//! ## Wire Format
//!
//! ```text
//! update:  ( varint column_idx , value )+
//! delete:  0xFC                               (exactly one byte)
//!
//! value:   fixed-width column  -> raw little-endian bytes, schema width
//!          variable-width col  -> varint length , payload bytes
//! ```
//!
//! The delete marker 0xFC (252) is one of the varint encoding's reserved
//! markers, so it can never be confused with the first byte of an encoded
//! column index. An empty buffer is not a valid changelist.
//!
//! ## Encoder Reuse
//!
//! One encoder instance serves many rows: call `reset` between rows and the
//! buffer is reused without reallocating. `as_changelist` borrows the
//! encoded bytes; the delta store copies them into its arena on insert, so
//! the encoder may be reset as soon as `update` returns.
//!
//! ## Decoder
//!
//! The decoder is lazy, single-pass, forward-only. Variable-width values
//! are yielded as references into the source buffer; consumers that outlive
//! the buffer must copy (the delta apply path copies into the column
//! block's own storage).

use eyre::{bail, ensure, Result};

use crate::columns::{CellValue, Schema};
use crate::encoding::{put_varint, read_varint};

/// Sole byte of an encoded row deletion. Reserved by the varint scheme, so
/// it never collides with an encoded column index.
pub(crate) const ROW_DELETE_MARKER: u8 = 252;

/// A borrowed view of one encoded changelist.
#[derive(Debug, Clone, Copy)]
pub struct RowChangeList<'a>(&'a [u8]);

impl<'a> RowChangeList<'a> {
    pub fn new(encoded: &'a [u8]) -> Self {
        Self(encoded)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds encoded changelists. Reusable across rows via [`reset`].
///
/// [`reset`]: RowChangeListEncoder::reset
pub struct RowChangeListEncoder<'a> {
    schema: &'a Schema,
    buf: Vec<u8>,
    is_delete: bool,
}

impl<'a> RowChangeListEncoder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            buf: Vec::new(),
            is_delete: false,
        }
    }

    /// Appends one column update. The value's type must match the schema
    /// column; mixing updates into a delete is a caller error.
    pub fn add_column_update(&mut self, col_idx: usize, value: CellValue<'_>) -> Result<()> {
        ensure!(!self.is_delete, "cannot add column update to a row deletion");
        let col = match self.schema.column(col_idx) {
            Some(col) => col,
            None => bail!(
                "column index {} out of range for schema with {} columns",
                col_idx,
                self.schema.column_count()
            ),
        };
        debug_assert!(
            value.matches(col.data_type),
            "value type mismatch for column {} ({:?})",
            col_idx,
            col.data_type
        );

        put_varint(&mut self.buf, col_idx as u64);
        match value {
            CellValue::UInt32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            CellValue::UInt64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            CellValue::Int64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            CellValue::Slice(s) => {
                put_varint(&mut self.buf, s.len() as u64);
                self.buf.extend_from_slice(s);
            }
        }
        Ok(())
    }

    /// Encodes "delete this row". Only valid as the sole content of a
    /// changelist.
    pub fn set_to_delete(&mut self) -> Result<()> {
        ensure!(
            self.buf.is_empty(),
            "row deletion cannot follow column updates"
        );
        self.buf.push(ROW_DELETE_MARKER);
        self.is_delete = true;
        Ok(())
    }

    /// Clears the encoder for the next row, keeping the buffer capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.is_delete = false;
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrows the encoded bytes. Valid until the next `reset` or
    /// `add_column_update`.
    pub fn as_changelist(&self) -> RowChangeList<'_> {
        RowChangeList(&self.buf)
    }
}

/// One decoded column change: the base-schema column index and the value's
/// wire bytes (fixed-width LE bytes, or the raw variable-width payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedChange<'a> {
    pub column_idx: usize,
    pub value: &'a [u8],
}

/// Lazy, single-pass decoder over one encoded changelist.
pub struct RowChangeListDecoder<'a> {
    schema: &'a Schema,
    remaining: &'a [u8],
    is_delete: bool,
}

impl<'a> RowChangeListDecoder<'a> {
    /// Validates the changelist framing and positions before the first
    /// entry. Empty or malformed buffers are corruption errors.
    pub fn new(schema: &'a Schema, changelist: RowChangeList<'a>) -> Result<Self> {
        let encoded = changelist.as_bytes();
        ensure!(!encoded.is_empty(), "corrupt changelist: empty buffer");
        if encoded[0] == ROW_DELETE_MARKER {
            ensure!(
                encoded.len() == 1,
                "corrupt changelist: {} trailing bytes after row-delete marker",
                encoded.len() - 1
            );
            return Ok(Self {
                schema,
                remaining: &[],
                is_delete: true,
            });
        }
        Ok(Self {
            schema,
            remaining: encoded,
            is_delete: false,
        })
    }

    /// True if this changelist deletes the whole row (and carries no column
    /// data).
    pub fn is_delete(&self) -> bool {
        self.is_delete
    }

    /// Decodes the next column change, or `None` at end of buffer.
    pub fn next_change(&mut self) -> Result<Option<DecodedChange<'a>>> {
        if self.remaining.is_empty() {
            return Ok(None);
        }

        let (col_idx, consumed) = read_varint(self.remaining)
            .map_err(|e| e.wrap_err("corrupt changelist: bad column index"))?;
        self.remaining = &self.remaining[consumed..];
        let col_idx = col_idx as usize;
        let col = match self.schema.column(col_idx) {
            Some(col) => col,
            None => bail!(
                "corrupt changelist: column index {} out of range for schema with {} columns",
                col_idx,
                self.schema.column_count()
            ),
        };

        let value_len = match col.data_type.fixed_size() {
            Some(width) => width,
            None => {
                let (len, consumed) = read_varint(self.remaining)
                    .map_err(|e| e.wrap_err("corrupt changelist: bad value length"))?;
                self.remaining = &self.remaining[consumed..];
                len as usize
            }
        };
        ensure!(
            self.remaining.len() >= value_len,
            "corrupt changelist: value for column {} truncated ({} of {} bytes)",
            col_idx,
            self.remaining.len(),
            value_len
        );
        let value = &self.remaining[..value_len];
        self.remaining = &self.remaining[value_len..];
        Ok(Some(DecodedChange { column_idx: col_idx, value }))
    }

    /// Fully decodes the changelist, verifying well-formedness. Used by
    /// debug-build validation at insert time.
    pub fn verify(mut self) -> Result<()> {
        while self.next_change()?.is_some() {}
        Ok(())
    }
}
