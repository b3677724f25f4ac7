// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Segregated free lists.
//!
//! Each bucket is a doubly-linked list of free blocks threaded through
//! the first two words of their payload area (word 0 = prev, word 1 =
//! next). Insertion is always at the tail, giving first-fit an
//! address-ordered bias within a bucket; removal works from anywhere
//! in constant time.

use crate::size_class::{free_index, LIMIT};
use crate::tags::BlockPtr;
use core::ptr;

/// Head/tail pointers for every size-class bucket.
///
/// Null (`ptr::null_mut()`) marks an empty bucket, matching how an
/// individual block's links are null when it has no free-list
/// neighbor — there is no separate "empty" sentinel type.
pub struct FreeLists {
    heads: [*mut u8; LIMIT],
    tails: [*mut u8; LIMIT],
}

impl Default for FreeLists {
    fn default() -> Self {
        FreeLists::new()
    }
}

impl FreeLists {
    pub const fn new() -> Self {
        FreeLists {
            heads: [ptr::null_mut(); LIMIT],
            tails: [ptr::null_mut(); LIMIT],
        }
    }

    /// Appends `block` to the back of its size class's bucket.
    ///
    /// Side effect per spec: the block's successor's prev-allocated
    /// bit is cleared, since `block` just became free.
    pub fn push(&mut self, block: BlockPtr) {
        let idx = free_index(block.size());
        let old_tail = self.tails[idx];

        unsafe {
            block.set_link_prev(old_tail);
            block.set_link_next(ptr::null_mut());
        }

        if old_tail.is_null() {
            self.heads[idx] = block.as_ptr();
        } else {
            unsafe { BlockPtr::new(old_tail).set_link_next(block.as_ptr()) };
        }
        self.tails[idx] = block.as_ptr();

        block.next_block().set_prev_alloc(false);
    }

    /// Splices `block` out of its bucket, wherever it sits.
    ///
    /// Side effect per spec: the block's successor's prev-allocated
    /// bit is set, since `block` is about to stop being free.
    pub fn remove(&mut self, block: BlockPtr) {
        let idx = free_index(block.size());
        let (prev, next) = unsafe { (block.link_prev(), block.link_next()) };

        if prev.is_null() {
            self.heads[idx] = next;
        } else {
            unsafe { BlockPtr::new(prev).set_link_next(next) };
        }

        if next.is_null() {
            self.tails[idx] = prev;
        } else {
            unsafe { BlockPtr::new(next).set_link_prev(prev) };
        }

        block.next_block().set_prev_alloc(true);
    }

    /// First-fit search for a free block of at least `asize` bytes,
    /// starting at `free_index(asize)` and scanning higher buckets.
    pub fn find_fit(&self, asize: usize) -> Option<BlockPtr> {
        for idx in free_index(asize)..LIMIT {
            let mut cur = self.heads[idx];
            while !cur.is_null() {
                let block = unsafe { BlockPtr::new(cur) };
                if block.size() >= asize {
                    return Some(block);
                }
                cur = unsafe { block.link_next() };
            }
        }
        None
    }

    /// Iterates the free blocks of a single bucket, in list order.
    pub fn bucket(&self, idx: usize) -> BucketIter {
        BucketIter { cur: self.heads[idx] }
    }

    /// The head pointer of bucket `idx` (raw, for integrity checking).
    pub fn head(&self, idx: usize) -> *mut u8 {
        self.heads[idx]
    }

    /// The tail pointer of bucket `idx` (raw, for integrity checking).
    pub fn tail(&self, idx: usize) -> *mut u8 {
        self.tails[idx]
    }
}

/// Iterator over one bucket's free blocks.
pub struct BucketIter {
    cur: *mut u8,
}

impl Iterator for BucketIter {
    type Item = BlockPtr;

    fn next(&mut self) -> Option<BlockPtr> {
        if self.cur.is_null() {
            return None;
        }
        let block = unsafe { BlockPtr::new(self.cur) };
        self.cur = unsafe { block.link_next() };
        Some(block)
    }
}
