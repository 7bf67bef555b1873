//! # Encoding Module
//!
//! Wire-level encoding primitives for the delta core:
//!
//! - **Varint encoding**: Variable-length integers for changelist column
//!   indices and value lengths

pub mod varint;

pub use varint::{put_varint, read_varint, varint_len};
