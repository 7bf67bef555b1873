//! # Arena Allocator
//!
//! A growable bump allocator that owns copies of variable-length buffers.
//! Callers hand in transient byte slices; `alloc_copy` returns a compact
//! [`ArenaRef`] handle to a stable copy inside the arena, and the caller's
//! buffer can be freed or reused immediately.
//!
//! ## Concurrency
//!
//! Allocation is serialized by an internal `parking_lot::Mutex` around the
//! `bumpalo::Bump` region, so any number of writer threads may allocate
//! concurrently. Reads through `ArenaRef` take no lock: once written, arena
//! bytes are immutable until `reset`.
//!
//! ## Reclaim
//!
//! `reset` reclaims every allocation at once and requires `&mut self`, so
//! it cannot race with concurrent allocation. It invalidates all previously
//! issued `ArenaRef`s; dereferencing a stale handle is the documented
//! safety contract of [`ArenaRef::as_slice`].
//!
//! ## Safety Considerations
//!
//! `bumpalo` never moves or frees an allocation until the `Bump` is reset
//! or dropped, which is what makes handing out raw-pointer handles sound.
//! The delta store, the one production consumer, never resets its arena
//! while alive, so its wrapper accessor is safe.

use std::ptr::NonNull;

use bumpalo::Bump;
use parking_lot::Mutex;

/// A compact, copyable handle to bytes owned by an [`Arena`].
#[derive(Debug, Clone, Copy)]
pub struct ArenaRef {
    ptr: NonNull<u8>,
    len: u32,
}

// INVARIANT: the pointed-to bytes are written exactly once, under the
// arena's allocation mutex, before the handle escapes; afterwards they are
// read-only for the life of the arena.
unsafe impl Send for ArenaRef {}
unsafe impl Sync for ArenaRef {}

impl ArenaRef {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reborrows the copied bytes.
    ///
    /// # Safety
    ///
    /// The arena this handle was allocated from must still be alive and
    /// must not have been `reset` since the allocation. The returned
    /// lifetime is chosen by the caller and must not outlive the arena.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len as usize)
    }
}

// Handle lengths are 32-bit; reject wider payloads up front instead of
// truncating them into a short slice.
fn checked_handle_len(len: usize) -> u32 {
    assert!(
        len <= u32::MAX as usize,
        "arena allocation of {len} bytes exceeds the 4 GiB handle limit"
    );
    len as u32
}

/// Growable bump allocator with copy-in ownership and bulk reclaim.
pub struct Arena {
    bump: Mutex<Bump>,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_capacity(16 * 1024)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Mutex::new(Bump::with_capacity(bytes)),
        }
    }

    /// Copies `data` into the arena and returns a stable handle to the copy.
    ///
    /// Handles store their length in 32 bits, so a single allocation is
    /// limited to `u32::MAX` bytes; anything wider aborts rather than
    /// truncates.
    pub fn alloc_copy(&self, data: &[u8]) -> ArenaRef {
        let len = checked_handle_len(data.len());
        let bump = self.bump.lock();
        let dst = bump.alloc_slice_copy(data);
        let ptr = NonNull::new(dst.as_mut_ptr()).unwrap_or(NonNull::dangling());
        ArenaRef { ptr, len }
    }

    /// Total bytes allocated from the arena, including chunk slack.
    pub fn bytes_allocated(&self) -> usize {
        self.bump.lock().allocated_bytes()
    }

    /// Reclaims every allocation at once. Exclusive access guarantees no
    /// allocation is in flight; all outstanding `ArenaRef`s are invalidated.
    pub fn reset(&mut self) {
        let bump = self.bump.get_mut();
        bump.reset();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("bytes_allocated", &self.bytes_allocated())
            .finish()
    }
}
