// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Placer/splitter: installs an allocation into a chosen free block.

use crate::free_list::FreeLists;
use crate::tags::{BlockPtr, MIN_BLOCK_SIZE};

/// Places an allocation of `asize` bytes into free block `block`,
/// splitting off a free remainder when it would meet the minimum
/// block size. `block` must still be a member of `free_lists`.
///
/// `block`'s footer is never written when it becomes allocated: the
/// footer slot reverts to payload space the instant the header's
/// allocated bit is set.
pub fn place(block: BlockPtr, asize: usize, free_lists: &mut FreeLists) {
    let csize = block.size();
    let leftover = csize - asize;

    if leftover >= MIN_BLOCK_SIZE {
        let prev_alloc = block.prev_alloc();
        free_lists.remove(block);
        block.write_header(asize, true, prev_alloc);

        let tail = block.next_block();
        tail.write_header(leftover, false, true);
        tail.write_footer(leftover, false);
        free_lists.push(tail);
    } else {
        let prev_alloc = block.prev_alloc();
        block.write_header(csize, true, prev_alloc);
        free_lists.remove(block);
    }
}
