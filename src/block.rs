use std::{fmt, mem, ptr, ptr::NonNull};

use log::trace;

/// Header stored in front of every block, free or allocated.
///
/// `next` only means something while the block sits in the free list.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Block {
  pub size: usize,
  pub next: *mut u8,
}

/// Distance from a header to its payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

/// Address of a block header.
///
/// Sizes are never rounded, so a header may start at any byte address. All
/// header access goes through unaligned reads and writes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlockPtr(NonNull<u8>);

impl BlockPtr {
  /// # Safety
  ///
  /// `header` must point to [`HEADER_SIZE`] readable and writable bytes that
  /// hold (or are about to hold, see [`BlockPtr::init`]) a block header.
  pub unsafe fn from_header(header: NonNull<u8>) -> Self {
    Self(header)
  }

  /// Recovers the header of a payload pointer handed out by the allocator.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`BlockPtr::payload`].
  pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
    Self(unsafe { payload.sub(HEADER_SIZE) })
  }

  /// Writes a fresh header at `header` recording `size` payload bytes.
  ///
  /// # Safety
  ///
  /// `header` must point to `HEADER_SIZE + size` writable bytes.
  pub unsafe fn init(
    header: NonNull<u8>,
    size: usize,
  ) -> Self {
    unsafe {
      header.cast::<Block>().as_ptr().write_unaligned(Block {
        size,
        next: ptr::null_mut(),
      });
      Self::from_header(header)
    }
  }

  pub fn header(self) -> NonNull<u8> {
    self.0
  }

  fn raw(self) -> *mut Block {
    self.0.cast::<Block>().as_ptr()
  }

  /// Pointer handed to callers, exactly [`HEADER_SIZE`] past the header.
  pub fn payload(self) -> NonNull<u8> {
    unsafe { self.0.add(HEADER_SIZE) }
  }

  /// # Safety
  ///
  /// The header must be valid.
  pub unsafe fn size(self) -> usize {
    unsafe { (&raw const (*self.raw()).size).read_unaligned() }
  }

  /// # Safety
  ///
  /// The header must be valid and the block must own `size` payload bytes.
  pub unsafe fn set_size(
    self,
    size: usize,
  ) {
    unsafe { (&raw mut (*self.raw()).size).write_unaligned(size) }
  }

  /// # Safety
  ///
  /// The header must be valid.
  pub unsafe fn next(self) -> Option<BlockPtr> {
    let next = unsafe { (&raw const (*self.raw()).next).read_unaligned() };
    NonNull::new(next).map(BlockPtr)
  }

  /// # Safety
  ///
  /// The header must be valid.
  pub unsafe fn set_next(
    self,
    next: Option<BlockPtr>,
  ) {
    let next = next.map_or(ptr::null_mut(), |block| block.0.as_ptr());
    unsafe { (&raw mut (*self.raw()).next).write_unaligned(next) }
  }

  /// First byte past the payload.
  ///
  /// # Safety
  ///
  /// The header must be valid.
  pub unsafe fn end(self) -> *mut u8 {
    unsafe { self.0.as_ptr().add(HEADER_SIZE + self.size()) }
  }

  /// Carves a remainder block off the tail, keeping `size` bytes in front.
  ///
  /// Returns `None` when the block cannot hold `size` bytes plus a
  /// remainder header; the block is left untouched in that case. The
  /// remainder inherits this block's `next` link, list membership is the
  /// caller's business.
  ///
  /// # Safety
  ///
  /// The header must be valid.
  pub unsafe fn split(
    self,
    size: usize,
  ) -> Option<BlockPtr> {
    unsafe {
      let total = self.size();
      let needed = size.checked_add(HEADER_SIZE)?;

      if total < needed {
        return None;
      }

      let remainder = BlockPtr(self.0.add(needed));
      remainder.set_size(total - needed);
      remainder.set_next(self.next());

      self.set_size(size);

      trace!(
        "split block {:p}: kept {} bytes, remainder {:p} with {} bytes",
        self.0,
        size,
        remainder.0,
        total - needed
      );

      Some(remainder)
    }
  }
}

impl fmt::Debug for BlockPtr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "BlockPtr({:p})", self.0)
  }
}
