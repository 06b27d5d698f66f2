//! The process-wide heap on the real program break.
//!
//! These functions follow the C allocator conventions: failure is reported
//! as a null pointer and freeing null does nothing. They share one
//! [`LockedHeap<Sbrk>`](crate::LockedHeap).

use std::ptr::{self, NonNull};

use crate::{boundary::Sbrk, locked::LockedHeap};

static HEAP: LockedHeap<Sbrk> = LockedHeap::new(Sbrk);

/// Allocates `size` bytes, or returns null.
pub fn allocate(size: usize) -> *mut u8 {
  HEAP.allocate(size).map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Allocates `count * size` zeroed bytes, or returns null.
pub fn allocate_zeroed(
  count: usize,
  size: usize,
) -> *mut u8 {
  HEAP
    .allocate_zeroed(count, size)
    .map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Resizes `ptr` to `new_size` bytes. Returns null, leaving `ptr` valid, on
/// failure.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this module.
pub unsafe fn reallocate(
  ptr: *mut u8,
  new_size: usize,
) -> *mut u8 {
  unsafe { HEAP.reallocate(NonNull::new(ptr), new_size) }.map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Releases `ptr`. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this module.
pub unsafe fn free(ptr: *mut u8) {
  unsafe { HEAP.free(NonNull::new(ptr)) }
}

/// Current program break.
pub fn heap_end() -> *mut u8 {
  HEAP.heap_end()
}
