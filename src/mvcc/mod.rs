//! # Multi-Version Concurrency Control (MVCC)
//!
//! This module defines transaction visibility for the delta core. Writers
//! obtain monotonically increasing transaction IDs from a per-segment
//! [`MvccManager`]; readers capture immutable [`MvccSnapshot`]s that decide,
//! for every transaction ID, whether its writes may be observed.
//!
//! ## Design Philosophy
//!
//! ### Commit Order, Not Wall Clock
//!
//! Transaction IDs define commit order. A snapshot never observes a
//! transaction that was still in flight when the snapshot was captured,
//! regardless of how the IDs compare numerically - visibility is decided by
//! membership in the captured in-flight set, never by ID comparison alone.
//!
//! ### No Abort Path
//!
//! The only terminal state is `Committed`. A [`ScopedTransaction`] commits
//! on drop on every exit path, including error returns, so a failed update
//! still becomes a visible delta. Callers that never drop their guard leave
//! the ID permanently in flight. This mirrors the original system's
//! contract; rollback semantics are deliberately not introduced.
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! start_transaction() ──> In-flight ──> commit_transaction() ──> Committed
//!                                                                (terminal)
//! ```
//!
//! ## Snapshot Semantics
//!
//! A snapshot captures the in-flight set at one instant. A transaction ID
//! is committed in the snapshot iff it had been started and committed
//! strictly before capture:
//!
//! ```text
//!      committed     in-flight    committed   in-flight     unstarted
//! IDs: 1  2  3  4  |     5     |  6  7     |     8      |  9  10 ...
//!
//! snapshot: all_committed_before = 5, committed = {6, 7}
//! is_committed(4) = true    is_committed(5) = false
//! is_committed(7) = true    is_committed(9) = false
//! ```
//!
//! Once captured, a snapshot's answer for any ID never changes, even as
//! later transactions commit.
//!
//! ## Concurrency Model
//!
//! - Manager state (next ID + in-flight set) sits behind one
//!   `parking_lot::Mutex`; start/commit/snapshot interleave arbitrarily
//!   across threads
//! - Snapshots are plain immutable values, freely cloned and shared
//! - The manager is an explicit injectable object with the lifetime of its
//!   owning tablet segment, never a process singleton

pub mod manager;
pub mod snapshot;

pub use manager::{MvccManager, ScopedTransaction};
pub use snapshot::MvccSnapshot;

/// 8-byte transaction identifier. ID 0 is reserved and never issued; the
/// first transaction gets ID 1.
pub type TxnId = u64;
