// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Allocator surface: `init`, `allocate`, `free`, `resize`,
//! `zero_allocate`, `check_integrity`.
//!
//! Orchestrates the block layout, size-class index, free lists,
//! coalescer, and placer over a [`HeapSource`] backend.

use log::{trace, warn};

use crate::coalesce::coalesce;
use crate::config::HeapConfig;
use crate::error::HeapError;
use crate::free_list::FreeLists;
use crate::heap::{HeapSource, SimHeap};
use crate::place::place;
use crate::size_class::{free_index, LIMIT};
use crate::tags::{extract_alloc, extract_size, round_up, BlockPtr, DSIZE, MIN_BLOCK_SIZE, WSIZE};

/// A segregated-fit allocator over a single heap region.
///
/// Not scattered mutable statics: all state — the heap backend, the
/// free-list index, the epilogue pointer — lives in one value, so
/// multiple independent heaps can coexist (useful for tests), even
/// though a production embedding typically keeps exactly one.
pub struct RustuxAllocator<H: HeapSource = SimHeap> {
    heap: H,
    free_lists: FreeLists,
    config: HeapConfig,
    /// Address of the prologue footer; `None` until `init` succeeds.
    heap_start: Option<*mut u8>,
    /// Address of the current epilogue header.
    heap_listp: Option<*mut u8>,
}

impl<H: HeapSource + Default> RustuxAllocator<H> {
    /// Builds an allocator over a freshly-defaulted heap backend.
    /// `init` still must be called (or is invoked lazily by `allocate`).
    pub fn new(config: HeapConfig) -> Self {
        Self::with_heap(H::default(), config)
    }
}

impl<H: HeapSource> RustuxAllocator<H> {
    /// Builds an allocator over a caller-supplied heap backend.
    pub fn with_heap(heap: H, config: HeapConfig) -> Self {
        RustuxAllocator {
            heap,
            free_lists: FreeLists::new(),
            config,
            heap_start: None,
            heap_listp: None,
        }
    }

    /// Idempotent: the first call lays down the prologue/epilogue and
    /// extends the heap by one chunk; later calls are no-ops returning
    /// `true`.
    pub fn init(&mut self) -> bool {
        if self.heap_start.is_some() {
            return true;
        }

        let bp = match self.heap.grow(2 * WSIZE) {
            Ok(p) => p,
            Err(_) => return false,
        };

        unsafe {
            // Prologue footer: zero-size, allocated — a sentinel with
            // no preceding neighbor to coalesce with.
            bp.cast::<u64>().write(crate::tags::pack(0, true));
        }
        let epilogue = unsafe { BlockPtr::new(bp.add(WSIZE)) };
        // prev-allocated starts true: there is no real predecessor yet.
        epilogue.write_header(0, true, true);

        self.heap_start = Some(bp);
        self.heap_listp = Some(epilogue.as_ptr());

        trace!("init: prologue/epilogue laid down at {bp:p}");

        self.extend_heap(self.config.chunk_size).is_some()
    }

    fn ensure_init(&mut self) -> bool {
        if self.heap_start.is_some() {
            true
        } else {
            self.init()
        }
    }

    /// Extends the heap by `size` bytes (rounded up to a multiple of
    /// 16), reusing the former epilogue's 8 bytes as the new block's
    /// header, and coalesces the result with any preceding free block.
    fn extend_heap(&mut self, size: usize) -> Option<BlockPtr> {
        let rounded = round_up(size, DSIZE);
        let bp = self.heap.grow(rounded).ok()?;

        // `bp` is the address right after the old epilogue; subtracting
        // one header width lands exactly on the old epilogue's address,
        // reusing those 8 bytes as the new block's header.
        let block = unsafe { BlockPtr::new(bp.sub(WSIZE)) };
        let prev_alloc = block.prev_alloc();

        block.write_header(rounded, false, prev_alloc);
        block.write_footer(rounded, false);

        let new_epilogue = block.next_block();
        new_epilogue.write_header(0, true, false);
        self.heap_listp = Some(new_epilogue.as_ptr());

        trace!("extend_heap: grew by {rounded} bytes, new block at {:p}", block.as_ptr());

        Some(coalesce(block, &mut self.free_lists))
    }

    /// Allocates at least `size` bytes, returning a 16-byte-aligned
    /// payload pointer, or null if `size` is 0 or the heap cannot grow
    /// far enough.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        if !self.ensure_init() {
            return core::ptr::null_mut();
        }
        if size == 0 {
            return core::ptr::null_mut();
        }

        let asize = if size <= 24 {
            MIN_BLOCK_SIZE
        } else {
            round_up(size + WSIZE, DSIZE)
        };

        let block = match self.free_lists.find_fit(asize) {
            Some(b) => b,
            None => {
                let grow_by = asize.max(self.config.chunk_size);
                warn!("allocate: no fit for {asize} bytes, extending heap by {grow_by}");
                match self.extend_heap(grow_by) {
                    Some(b) => b,
                    None => return core::ptr::null_mut(),
                }
            }
        };

        place(block, asize, &mut self.free_lists);
        trace!("allocate({size}) -> {:p} (asize={asize})", block.payload());
        block.payload()
    }

    /// Frees a pointer previously returned by `allocate`/`resize`/
    /// `zero_allocate`. A null pointer is a no-op.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a pointer previously returned by
    /// `allocate`/`resize`/`zero_allocate` on this allocator, not yet
    /// freed.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        let block = unsafe { BlockPtr::from_payload(ptr) };
        let size = block.size();
        let prev_alloc = block.prev_alloc();

        block.write_header(size, false, prev_alloc);
        block.write_footer(size, false);
        block.next_block().set_prev_alloc(false);

        trace!("free({ptr:p}) size={size}");
        coalesce(block, &mut self.free_lists);
    }

    /// Resizes the allocation at `ptr` to `size` bytes, preserving the
    /// first `min(old, size)` bytes. `ptr == null` behaves like
    /// `allocate`; `size == 0` behaves like `free` and returns null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a pointer previously returned by
    /// `allocate`/`resize`/`zero_allocate` on this allocator, not yet
    /// freed.
    pub unsafe fn resize(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.allocate(size);
        }
        if size == 0 {
            unsafe { self.free(ptr) };
            return core::ptr::null_mut();
        }

        let old_block = unsafe { BlockPtr::from_payload(ptr) };
        let old_payload_size = old_block.size() - WSIZE;

        let new_ptr = self.allocate(size);
        if new_ptr.is_null() {
            return core::ptr::null_mut();
        }

        let copy_len = size.min(old_payload_size);
        unsafe { core::ptr::copy_nonoverlapping(ptr, new_ptr, copy_len) };

        unsafe { self.free(ptr) };
        new_ptr
    }

    /// `count * size` bytes, zero-filled. Returns null (no allocation
    /// performed) if the product overflows `usize`.
    pub fn zero_allocate(&mut self, count: usize, size: usize) -> *mut u8 {
        let total = match count.checked_mul(size) {
            Some(t) => t,
            None => return core::ptr::null_mut(),
        };

        let ptr = self.allocate(total);
        if !ptr.is_null() {
            unsafe { core::ptr::write_bytes(ptr, 0, total) };
        }
        ptr
    }

    fn in_heap(&self, addr: *const u8) -> bool {
        match (self.heap_start, self.heap_listp) {
            (Some(start), Some(epi)) => {
                let end = unsafe { epi.add(WSIZE) };
                (addr as usize) >= (start as usize) && (addr as usize) < (end as usize)
            }
            _ => false,
        }
    }

    /// Scans the heap and free-list index, verifying every invariant
    /// in spec §3/§8. Returns `true` iff they all hold.
    pub fn check_integrity(&self) -> bool {
        self.check_integrity_detailed().is_ok()
    }

    /// Same as [`check_integrity`](Self::check_integrity) but reports
    /// which invariant failed; used by tests.
    pub fn check_integrity_detailed(&self) -> Result<(), HeapError> {
        let (heap_start, _heap_listp) = match (self.heap_start, self.heap_listp) {
            (Some(s), Some(e)) => (s, e),
            _ => return Ok(()), // not yet initialized: vacuously fine
        };

        let mut cur = unsafe { BlockPtr::new(heap_start.add(WSIZE)) };
        let mut prev_was_alloc = true; // the prologue counts as allocated

        loop {
            if !self.in_heap(cur.as_ptr()) {
                return Err(HeapError::CorruptHeap(format!(
                    "block at {:p} lies outside the heap",
                    cur.as_ptr()
                )));
            }
            // The invariant is on payload alignment (spec §8), not the
            // header address itself, which always sits WSIZE before a
            // 16-byte boundary.
            if !(cur.payload() as usize).is_multiple_of(DSIZE) {
                return Err(HeapError::CorruptHeap(format!(
                    "payload at {:p} is not 16-byte aligned",
                    cur.payload()
                )));
            }

            let size = cur.size();
            if size == 0 {
                break; // reached the epilogue
            }
            if size < MIN_BLOCK_SIZE || !size.is_multiple_of(DSIZE) {
                return Err(HeapError::CorruptHeap(format!(
                    "block at {:p} has invalid size {size}",
                    cur.as_ptr()
                )));
            }
            if cur.prev_alloc() != prev_was_alloc {
                return Err(HeapError::CorruptHeap(format!(
                    "block at {:p} has stale prev-allocated bit",
                    cur.as_ptr()
                )));
            }

            let is_alloc = cur.is_alloc();
            if !is_alloc {
                let footer = cur.footer();
                if extract_size(footer) != size || extract_alloc(footer) {
                    return Err(HeapError::CorruptHeap(format!(
                        "free block at {:p} header/footer disagree",
                        cur.as_ptr()
                    )));
                }
            }

            let next = cur.next_block();
            if !is_alloc && !next.is_alloc() {
                return Err(HeapError::CorruptHeap(format!(
                    "uncoalesced free blocks at {:p} and {:p}",
                    cur.as_ptr(),
                    next.as_ptr()
                )));
            }

            prev_was_alloc = is_alloc;
            cur = next;
        }

        for idx in 0..LIMIT {
            let head = self.free_lists.head(idx);
            if !head.is_null() && !unsafe { BlockPtr::new(head).link_prev() }.is_null() {
                return Err(HeapError::CorruptHeap(format!("bucket {idx} head.prev is non-null")));
            }
            let tail = self.free_lists.tail(idx);
            if !tail.is_null() && !unsafe { BlockPtr::new(tail).link_next() }.is_null() {
                return Err(HeapError::CorruptHeap(format!("bucket {idx} tail.next is non-null")));
            }

            for block in self.free_lists.bucket(idx) {
                if block.is_alloc() {
                    return Err(HeapError::CorruptHeap(format!(
                        "allocated block {:p} found in free bucket {idx}",
                        block.as_ptr()
                    )));
                }
                if free_index(block.size()) != idx {
                    return Err(HeapError::CorruptHeap(format!(
                        "block {:p} of size {} sits in bucket {idx}, expected {}",
                        block.as_ptr(),
                        block.size(),
                        free_index(block.size())
                    )));
                }
            }
        }

        Ok(())
    }

    /// Which bucket a free block of this size would be filed in;
    /// exposed for tests that assert concrete scenarios from spec §8.
    pub fn bucket_of(size: usize) -> usize {
        free_index(size)
    }
}
