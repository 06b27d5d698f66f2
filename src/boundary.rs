use std::{alloc, ptr::NonNull};

use log::debug;

use crate::{align::ALIGNMENT, error::HeapError};

/// The end of a contiguous, growable heap region.
///
/// # Safety
///
/// Implementors must hand out memory the way a program break does: a
/// successful `grow(n)` returns the old [`current`](HeapBoundary::current)
/// address, after which `n` bytes from there are readable, writable and owned
/// by the caller until they are given back with `shrink`.
pub unsafe trait HeapBoundary {
  /// Extends the heap by `bytes` and returns the start of the new region.
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, HeapError>;

  /// Retracts the heap by `bytes`.
  ///
  /// # Safety
  ///
  /// `bytes` must not exceed what was grown through this boundary, and
  /// nothing in the retracted range may be used afterwards.
  unsafe fn shrink(
    &mut self,
    bytes: usize,
  );

  /// Current end of the heap.
  fn current(&self) -> *mut u8;
}

/// The process's real program break, moved with `sbrk(2)`.
///
/// Anything else in the process that moves the break (the platform `malloc`
/// included) shares it. Memory is only ever given back when the freed block
/// still ends exactly at the break.
#[cfg(all(unix, feature = "sbrk"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

#[cfg(all(unix, feature = "sbrk"))]
unsafe impl HeapBoundary for Sbrk {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    use libc::{c_void, intptr_t, sbrk};

    let increment = intptr_t::try_from(bytes).map_err(|_| HeapError::OutOfMemory)?;
    let address = unsafe { sbrk(increment) };

    if address == usize::MAX as *mut c_void {
      debug!("sbrk({}) failed", bytes);
      return Err(HeapError::OutOfMemory);
    }

    NonNull::new(address.cast::<u8>()).ok_or(HeapError::OutOfMemory)
  }

  unsafe fn shrink(
    &mut self,
    bytes: usize,
  ) {
    unsafe { libc::sbrk(-(bytes as libc::intptr_t)) };
  }

  fn current(&self) -> *mut u8 {
    unsafe { libc::sbrk(0) }.cast::<u8>()
  }
}

/// A simulated program break over one fixed-capacity buffer.
///
/// Each arena is an independent heap, which makes it suitable for running
/// several allocators side by side and for observing heap growth and shrink
/// exactly.
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
  brk: usize,
}

// The arena exclusively owns its buffer.
unsafe impl Send for Arena {}

impl Arena {
  /// Reserves a backing buffer of `capacity` bytes, rounded up to
  /// [`ALIGNMENT`].
  pub fn with_capacity(capacity: usize) -> Result<Self, HeapError> {
    if capacity == 0 || capacity > usize::MAX - ALIGNMENT {
      return Err(HeapError::InvalidSize);
    }

    let capacity = crate::align_up!(capacity);

    let layout = alloc::Layout::from_size_align(capacity, ALIGNMENT)
      .map_err(|_| HeapError::InvalidSize)?;
    let base = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(HeapError::OutOfMemory)?;

    debug!("reserved arena of {} bytes at {:p}", capacity, base);

    Ok(Self {
      base,
      capacity,
      brk: 0,
    })
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes currently below the break.
  pub fn used(&self) -> usize {
    self.brk
  }

  fn layout(&self) -> alloc::Layout {
    // Validated in `with_capacity`.
    unsafe { alloc::Layout::from_size_align_unchecked(self.capacity, ALIGNMENT) }
  }
}

unsafe impl HeapBoundary for Arena {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    if bytes > self.capacity - self.brk {
      debug!(
        "arena exhausted: {} bytes requested, {} available",
        bytes,
        self.capacity - self.brk
      );
      return Err(HeapError::OutOfMemory);
    }

    let address = unsafe { self.base.add(self.brk) };
    self.brk += bytes;

    Ok(address)
  }

  unsafe fn shrink(
    &mut self,
    bytes: usize,
  ) {
    debug_assert!(bytes <= self.brk, "shrinking below the arena base");
    self.brk -= bytes;
  }

  fn current(&self) -> *mut u8 {
    unsafe { self.base.as_ptr().add(self.brk) }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout()) };
  }
}
