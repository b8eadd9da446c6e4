//! The encrypting write path must not touch the heap.
//!
//! Runs in its own test binary because it installs a global allocator.

#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use walcrypt_core::SegmentPosition;
use walcrypt_storage::InMemorySegment;
use walcrypt_testkit::prelude::*;

struct CountingAlloc;

thread_local! {
    static COUNTING: Cell<bool> = const { Cell::new(false) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn record() {
    // try_with: the thread-local may already be gone during thread teardown.
    let _ = COUNTING.try_with(|counting| {
        if counting.get() {
            let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        }
    });
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record();
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record();
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn count_allocations<R>(f: impl FnOnce() -> R) -> (R, usize) {
    ALLOCATIONS.with(|n| n.set(0));
    COUNTING.with(|c| c.set(true));
    let result = f();
    COUNTING.with(|c| c.set(false));
    (result, ALLOCATIONS.with(Cell::get))
}

#[test]
fn encrypted_write_does_not_allocate() {
    let mut smgr = encrypted_smgr(8);
    // Pre-sized so writes stay within the existing vector.
    let segment = InMemorySegment::zeroed(8 * TEST_PAGE_SIZE);
    let position = SegmentPosition::new(1, 0);
    let first = first_pages(TEST_PAGE_SIZE, 4, 1);
    let later = body_pages(TEST_PAGE_SIZE, 4, 7);

    // Warm up once so lazily initialized state is in place.
    smgr.seg_write(&segment, &first, 0, position).unwrap();

    let (result, allocations) = count_allocations(|| {
        smgr.seg_write(&segment, &first, 0, position)?;
        smgr.seg_write(&segment, &later, 4 * TEST_PAGE_SIZE as u64, position)
    });

    assert_eq!(result.unwrap(), later.len());
    assert_eq!(allocations, 0);
}

#[test]
fn overflow_error_does_not_allocate() {
    let mut smgr = encrypted_smgr(2);
    let segment = InMemorySegment::zeroed(8 * TEST_PAGE_SIZE);
    let position = SegmentPosition::new(1, 0);
    let too_big = first_pages(TEST_PAGE_SIZE, 3, 1);

    let _ = smgr.seg_write(&segment, &too_big, 0, position);

    let (result, allocations) =
        count_allocations(|| smgr.seg_write(&segment, &too_big, 0, position));

    assert!(result.is_err());
    assert_eq!(allocations, 0);
}
