// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Error types for the heap primitive / integrity-checker boundary.
//!
//! The public allocator surface (`allocate`, `free`, `resize`,
//! `zero_allocate`) never returns a `Result` — it returns raw pointers,
//! null on failure, matching spec.md's malloc-style contract. These
//! errors exist at the internal boundary: the [`HeapSource`](crate::heap::HeapSource)
//! contract and [`check_integrity`](crate::alloc::RustuxAllocator::check_integrity).

use thiserror::Error;

/// Failure modes below the public surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// The heap primitive returned its sentinel; the heap could not grow.
    #[error("heap primitive failed to grow by the requested amount")]
    GrowFailed,

    /// `zero_allocate`'s `count * size` overflowed `usize`.
    #[error("zero_allocate size overflow")]
    SizeOverflow,

    /// `check_integrity` found a violated invariant.
    #[error("heap integrity violation: {0}")]
    CorruptHeap(String),
}
