use std::ptr::NonNull;

use spin::{Mutex, MutexGuard};

use crate::{
  boundary::HeapBoundary,
  error::HeapError,
  heap::{FreeListAllocator, HeapStats},
};

/// A [`FreeListAllocator`] behind a single spinning mutex.
///
/// Every operation may touch any block in the free list, so the whole
/// allocator is locked for the duration of each call.
pub struct LockedHeap<B: HeapBoundary> {
  inner: Mutex<FreeListAllocator<B>>,
}

impl<B: HeapBoundary> LockedHeap<B> {
  pub const fn new(boundary: B) -> Self {
    Self {
      inner: Mutex::new(FreeListAllocator::new(boundary)),
    }
  }

  /// Locks the allocator for a sequence of operations.
  pub fn lock(&self) -> MutexGuard<'_, FreeListAllocator<B>> {
    self.inner.lock()
  }

  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.inner.lock().allocate(size)
  }

  pub fn allocate_zeroed(
    &self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.inner.lock().allocate_zeroed(count, size)
  }

  /// # Safety
  ///
  /// See [`FreeListAllocator::reallocate`].
  pub unsafe fn reallocate(
    &self,
    ptr: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    unsafe { self.inner.lock().reallocate(ptr, new_size) }
  }

  /// # Safety
  ///
  /// See [`FreeListAllocator::free`].
  pub unsafe fn free(
    &self,
    ptr: Option<NonNull<u8>>,
  ) {
    unsafe { self.inner.lock().free(ptr) }
  }

  /// # Safety
  ///
  /// See [`FreeListAllocator::usable_size`].
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { self.inner.lock().usable_size(ptr) }
  }

  pub fn heap_end(&self) -> *mut u8 {
    self.inner.lock().heap_end()
  }

  pub fn stats(&self) -> HeapStats {
    self.inner.lock().stats()
  }
}
