//! # Variable-Length Integer Encoding
//!
//! Varint encoding for the row-changelist wire format: column indices and
//! variable-width value lengths. The scheme dedicates the first byte as a
//! marker selecting the encoding width:
//!
//! | Value Range           | Bytes | First byte      |
//! |-----------------------|-------|-----------------|
//! | 0 - 240               | 1     | the value       |
//! | 241 - 2287            | 2     | 241 - 248       |
//! | 2288 - 67823          | 3     | 249             |
//! | 67824 - 0xFF_FFFF     | 4     | 250             |
//! | 0x100_0000 - u32::MAX | 5     | 251             |
//! | above u32::MAX        | 9     | 255             |
//!
//! Markers 252-254 are never produced by the encoder. That gap is load
//! bearing: the changelist codec claims 252 as its row-delete marker, which
//! can therefore never collide with an encoded column index.
//!
//! All functions operate on byte buffers directly and perform no heap
//! allocation beyond appending to the caller's `Vec`. `read_varint` returns
//! `eyre::Result` and fails on empty input, truncated encodings, and the
//! reserved markers.

use eyre::{bail, ensure, Result};

/// Markers 252 through 254 never begin a valid varint.
pub const RESERVED_MARKER_MIN: u8 = 252;
pub const RESERVED_MARKER_MAX: u8 = 254;

/// Returns the encoded length of `value` without encoding it.
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=240 => 1,
        241..=2287 => 2,
        2288..=67823 => 3,
        67824..=0xFF_FFFF => 4,
        0x100_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Appends the varint encoding of `value` to `buf`.
pub fn put_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=240 => buf.push(value as u8),
        241..=2287 => {
            let v = value - 240;
            buf.push(((v >> 8) + 241) as u8);
            buf.push((v & 0xFF) as u8);
        }
        2288..=67823 => {
            let v = value - 2288;
            buf.push(249);
            buf.push((v >> 8) as u8);
            buf.push((v & 0xFF) as u8);
        }
        67824..=0xFF_FFFF => {
            buf.push(250);
            buf.extend_from_slice(&(value as u32).to_be_bytes()[1..]);
        }
        0x100_0000..=0xFFFF_FFFF => {
            buf.push(251);
            buf.extend_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            buf.push(255);
            buf.extend_from_slice(&value.to_be_bytes());
        }
    }
}

/// Decodes one varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");
    let marker = buf[0];
    match marker {
        0..=240 => Ok((marker as u64, 1)),
        241..=248 => {
            ensure!(buf.len() >= 2, "truncated 2-byte varint");
            Ok((240 + ((marker as u64 - 241) << 8) + buf[1] as u64, 2))
        }
        249 => {
            ensure!(buf.len() >= 3, "truncated 3-byte varint");
            Ok((2288 + ((buf[1] as u64) << 8) + buf[2] as u64, 3))
        }
        250 => {
            ensure!(buf.len() >= 4, "truncated 4-byte varint");
            let v = ((buf[1] as u64) << 16) | ((buf[2] as u64) << 8) | buf[3] as u64;
            Ok((v, 4))
        }
        251 => {
            ensure!(buf.len() >= 5, "truncated 5-byte varint");
            let mut be = [0u8; 4];
            be.copy_from_slice(&buf[1..5]);
            Ok((u32::from_be_bytes(be) as u64, 5))
        }
        255 => {
            ensure!(buf.len() >= 9, "truncated 9-byte varint");
            let mut be = [0u8; 8];
            be.copy_from_slice(&buf[1..9]);
            Ok((u64::from_be_bytes(be), 9))
        }
        _ => bail!("reserved varint marker: {}", marker),
    }
}
