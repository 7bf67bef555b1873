//! # Columns Module
//!
//! Schema and column-batch types consumed by the delta core:
//!
//! - **Schema**: Immutable column layout with pre-computed byte offsets
//! - **Projection**: A subset of a schema's columns with base-index mapping
//! - **ColumnBlock**: A caller-supplied column-major buffer for one scan batch
//!
//! These are the external interfaces of the surrounding tablet reader,
//! realized as owned types so the core is testable standalone.

mod block;
mod schema;

pub use block::ColumnBlock;
pub use schema::{CellValue, ColumnSchema, DataType, Projection, Schema};
