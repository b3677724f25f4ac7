// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Allocator configuration.

use crate::tags::CHUNKSIZE;

/// Tunable knobs for a [`RustuxAllocator`](crate::alloc::RustuxAllocator).
///
/// The block layout constants (word size, minimum block size, the
/// size-class thresholds) are not configurable — they are load-bearing
/// for the on-heap binary format and are compiled-in constants in
/// [`crate::tags`] and [`crate::size_class`]. `chunk_size` is the one
/// knob a host legitimately wants to vary, e.g. to exercise heap
/// extension in tests without growing by a full page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Minimum number of bytes requested from the heap primitive on
    /// each extension (rounded up to a multiple of 16).
    pub chunk_size: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNKSIZE,
        }
    }
}
