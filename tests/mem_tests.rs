// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Property checks for the allocator's laws: round-trip header/payload
//! recovery, free-then-allocate idempotence, resize prefix
//! preservation, and zero-allocate zeroing.

use quickcheck_macros::quickcheck;
use rustux_alloc::{HeapConfig, RustuxAllocator, SimHeap};

fn allocator() -> RustuxAllocator<SimHeap> {
    let _ = env_logger::try_init();
    RustuxAllocator::with_heap(SimHeap::new(16 << 20), HeapConfig { chunk_size: 4096 })
}

#[quickcheck]
fn free_then_allocate_never_fails_for_a_size_that_already_succeeded(size: usize) -> bool {
    let size = 1 + (size % 4096);
    let mut a = allocator();
    let p = a.allocate(size);
    if p.is_null() {
        return true; // precondition not met, vacuously true
    }
    unsafe { a.free(p) };
    !a.allocate(size).is_null()
}

#[quickcheck]
fn resize_preserves_prefix(k: usize, s: usize) -> bool {
    let k = 1 + (k % 512);
    let s = 1 + (s % 512);
    let mut a = allocator();
    let p = a.allocate(k);
    if p.is_null() {
        return true;
    }
    unsafe {
        for i in 0..k {
            *p.add(i) = (i % 251) as u8;
        }
    }
    let q = unsafe { a.resize(p, s) };
    if q.is_null() {
        return true;
    }
    let prefix = k.min(s);
    unsafe { (0..prefix).all(|i| *q.add(i) == (i % 251) as u8) }
}

#[quickcheck]
fn zero_allocate_zeroes_every_byte(count: u8, size: u8) -> bool {
    let count = 1 + (count as usize % 16);
    let size = 1 + (size as usize % 64);
    let mut a = allocator();
    let p = a.zero_allocate(count, size);
    if p.is_null() {
        return true;
    }
    unsafe { (0..count * size).all(|i| *p.add(i) == 0) }
}

#[test]
fn header_payload_round_trip() {
    use rustux_alloc::tags::BlockPtr;
    let mut a = allocator();
    let p = a.allocate(64);
    assert!(!p.is_null());
    let block = unsafe { BlockPtr::from_payload(p) };
    assert_eq!(block.payload(), p);
}
