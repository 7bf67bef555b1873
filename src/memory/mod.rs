//! # Memory Module
//!
//! Bump-allocation arena used by the delta store to take ownership of
//! encoded changes at insert time. Copy-in, bulk-reclaim: individual
//! allocations are never freed, the whole region is reset at once when the
//! owner is done with every allocation.

mod arena;

pub use arena::{Arena, ArenaRef};
