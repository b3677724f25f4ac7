// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Heap primitive contract.
//!
//! The block manager consumes a heap purely through this trait's
//! contract — "grow the heap, tell me the bounds" — never the
//! mechanism behind it. Production code would implement it over a
//! real `sbrk`/`brk`/`mmap` syscall; tests and doctests use
//! [`SimHeap`], a deterministic in-process arena grounded in the
//! `memlib.c` test harness that the spec's `mem_sbrk`/`mem_heap_lo`/
//! `mem_heap_hi` contract was distilled from.

use crate::error::HeapError;
use crate::tags::DSIZE;
use log::{debug, error};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

/// The lower-level heap growth primitive consumed by the block manager.
pub trait HeapSource {
    /// Extends the heap by exactly `n` bytes, returning a pointer to
    /// the first new byte. Fails (no heap mutation) if the backing
    /// store cannot grow that far.
    fn grow(&mut self, n: usize) -> Result<*mut u8, HeapError>;

    /// Inclusive lower bound of the current heap region.
    fn heap_low(&self) -> *const u8;

    /// Inclusive upper bound of the current heap region.
    fn heap_high(&self) -> *const u8;
}

/// A fixed-capacity, growable-by-bump-pointer heap arena.
///
/// Backed by a single pinned allocation, aligned to [`DSIZE`] so every
/// payload pointer the block manager hands out inherits that
/// alignment by construction — pointers handed out by `grow` stay
/// valid for the arena's lifetime, only the logical break within it
/// advances, exactly like a real `sbrk` region backed by reserved
/// virtual memory.
pub struct SimHeap {
    arena: NonNull<u8>,
    capacity: usize,
    brk: usize,
}

impl SimHeap {
    fn layout(capacity: usize) -> Layout {
        Layout::from_size_align(capacity, DSIZE).expect("capacity/alignment overflow")
    }

    /// Reserves `capacity` bytes of arena, with the break initially at 0.
    pub fn new(capacity: usize) -> Self {
        let layout = Self::layout(capacity);
        let arena = unsafe { alloc_zeroed(layout) };
        let arena = NonNull::new(arena).expect("allocation of SimHeap arena failed");
        SimHeap {
            arena,
            capacity,
            brk: 0,
        }
    }
}

/// 64 MiB, ample for tests and doctests without being wasteful to allocate.
const DEFAULT_CAPACITY: usize = 64 * 1024 * 1024;

impl Default for SimHeap {
    fn default() -> Self {
        SimHeap::new(DEFAULT_CAPACITY)
    }
}

impl Drop for SimHeap {
    fn drop(&mut self) {
        unsafe { dealloc(self.arena.as_ptr(), Self::layout(self.capacity)) };
    }
}

impl HeapSource for SimHeap {
    fn grow(&mut self, n: usize) -> Result<*mut u8, HeapError> {
        if n > self.capacity - self.brk {
            error!(
                "SimHeap: grow({n}) exceeds remaining capacity ({} of {} used)",
                self.brk, self.capacity
            );
            return Err(HeapError::GrowFailed);
        }
        let old_brk = self.brk;
        self.brk += n;
        debug!("SimHeap: grew by {n} bytes, break now at {}", self.brk);
        Ok(unsafe { self.arena.as_ptr().add(old_brk) })
    }

    fn heap_low(&self) -> *const u8 {
        self.arena.as_ptr()
    }

    fn heap_high(&self) -> *const u8 {
        unsafe { self.arena.as_ptr().add(self.brk.saturating_sub(1)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_advances_break_and_returns_old_break() {
        let mut heap = SimHeap::new(4096);
        let p0 = heap.grow(256).unwrap();
        let p1 = heap.grow(256).unwrap();
        assert_eq!(unsafe { p1.offset_from(p0) }, 256);
    }

    #[test]
    fn grow_beyond_capacity_fails() {
        let mut heap = SimHeap::new(128);
        assert!(heap.grow(256).is_err());
    }
}
