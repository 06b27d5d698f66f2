use std::ptr::{self, NonNull};

use log::{debug, trace};

use crate::{
  block::{BlockPtr, HEADER_SIZE},
  boundary::HeapBoundary,
  error::HeapError,
  free_list::{self, FreeList},
};

/// First-fit free-list allocator on top of a growable heap region.
///
/// The allocator owns its free list and its [`HeapBoundary`]; several
/// independent instances can coexist as long as their boundaries do not
/// overlap. It is not synchronised, see [`LockedHeap`](crate::LockedHeap)
/// for sharing one between threads.
pub struct FreeListAllocator<B: HeapBoundary> {
  boundary: B,
  free: FreeList,
}

// Every block reachable from the free list lives inside memory owned through
// `boundary`, so moving the allocator moves that ownership along with it.
unsafe impl<B: HeapBoundary + Send> Send for FreeListAllocator<B> {}

impl<B: HeapBoundary> FreeListAllocator<B> {
  pub const fn new(boundary: B) -> Self {
    Self {
      boundary,
      free: FreeList::new(),
    }
  }

  pub fn boundary(&self) -> &B {
    &self.boundary
  }

  /// Current end of the heap.
  pub fn heap_end(&self) -> *mut u8 {
    self.boundary.current()
  }

  /// Hands out at least `size` bytes.
  ///
  /// Free blocks are tried in list order (most recently freed first) and the
  /// first one that is large enough is taken. If it has room for another
  /// header the tail is split off and goes back to the front of the list.
  /// When nothing fits the heap is grown by `size + HEADER_SIZE`.
  ///
  /// The returned pointer has no particular alignment.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    if size == 0 {
      return Err(HeapError::InvalidSize);
    }

    unsafe {
      if let Some(block) = self.free.first_fit(size) {
        self.free.unlink(block);

        if let Some(remainder) = block.split(size) {
          self.free.push_front(remainder);
        }

        trace!("allocate({}) reused {:?}", size, block);

        return Ok(block.payload());
      }
    }

    let block = self.grow(size)?;

    trace!("allocate({}) grew {:?}", size, block);

    Ok(block.payload())
  }

  /// Carves a fresh block for `size` bytes off the top of the heap.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<BlockPtr, HeapError> {
    let total = size.checked_add(HEADER_SIZE).ok_or(HeapError::InvalidSize)?;
    let address = self.boundary.grow(total).inspect_err(|err| {
      debug!("failed to grow heap by {} bytes: {}", total, err);
    })?;

    debug!("grew heap by {} bytes at {:p}", total, address);

    Ok(unsafe { BlockPtr::init(address, size) })
  }

  /// Hands out `count * size` zeroed bytes.
  pub fn allocate_zeroed(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    if count == 0 || size == 0 {
      return Err(HeapError::InvalidSize);
    }

    let total = count.checked_mul(size).ok_or(HeapError::InvalidSize)?;
    let payload = self.allocate(total)?;

    unsafe { ptr::write_bytes(payload.as_ptr(), 0, total) };

    Ok(payload)
  }

  /// Resizes an allocation.
  ///
  /// A missing pointer or a zero size degrades to
  /// [`allocate(new_size)`](Self::allocate), leaving `ptr` alone. Blocks that
  /// are already large enough are returned unchanged. Otherwise the contents
  /// move to a new block and the old one is freed; if the new block cannot
  /// be had the old one is left intact.
  ///
  /// # Safety
  ///
  /// `ptr`, if present, must be a live allocation of this allocator. On
  /// success it must not be used again unless it is the returned pointer.
  pub unsafe fn reallocate(
    &mut self,
    ptr: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    let Some(ptr) = ptr.filter(|_| new_size != 0) else {
      return self.allocate(new_size);
    };

    unsafe {
      let old_size = BlockPtr::from_payload(ptr).size();

      if old_size >= new_size {
        return Ok(ptr);
      }

      let moved = self.allocate(new_size)?;
      ptr::copy_nonoverlapping(ptr.as_ptr(), moved.as_ptr(), old_size.min(new_size));
      self.free(Some(ptr));

      trace!("reallocate moved {:p} ({} bytes) to {:p}", ptr, old_size, moved);

      Ok(moved)
    }
  }

  /// Returns an allocation to the heap. `None` is ignored.
  ///
  /// A block that ends exactly at the heap boundary is handed back to the
  /// boundary. Anything else goes to the front of the free list and is
  /// merged with adjacent free blocks.
  ///
  /// # Safety
  ///
  /// `ptr`, if present, must be a live allocation of this allocator and must
  /// not be used afterwards.
  pub unsafe fn free(
    &mut self,
    ptr: Option<NonNull<u8>>,
  ) {
    let Some(ptr) = ptr else {
      return;
    };

    unsafe {
      let block = BlockPtr::from_payload(ptr);

      if block.end() == self.boundary.current() {
        let total = block.size() + HEADER_SIZE;
        self.free.unlink(block);
        self.boundary.shrink(total);

        debug!("shrank heap by {} bytes", total);
        return;
      }

      self.free.push_front(block);
      let merged = self.free.coalesce(block);

      if merged != block {
        self.free.unlink(merged);
        self.free.push_front(merged);
      }

      trace!("freed {:?}, free list head is now {:?}", block, merged);
    }
  }

  /// Payload bytes recorded for a live allocation.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this allocator.
  pub unsafe fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { BlockPtr::from_payload(ptr).size() }
  }

  /// Free blocks in list order.
  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    FreeBlocks {
      inner: unsafe { self.free.iter() },
    }
  }

  pub fn stats(&self) -> HeapStats {
    self.free_blocks().fold(HeapStats::default(), |mut stats, block| {
      stats.free_blocks += 1;
      stats.free_bytes += block.size;
      stats.largest_free = stats.largest_free.max(block.size);
      stats
    })
  }
}

/// A block currently sitting in the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Where the payload would start if the block were handed out.
  pub payload: NonNull<u8>,
  /// Recorded payload size.
  pub size: usize,
}

pub struct FreeBlocks<'a> {
  inner: free_list::Iter<'a>,
}

impl Iterator for FreeBlocks<'_> {
  type Item = FreeBlock;

  fn next(&mut self) -> Option<FreeBlock> {
    let block = self.inner.next()?;

    Some(FreeBlock {
      payload: block.payload(),
      size: unsafe { block.size() },
    })
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub free_blocks: usize,
  pub free_bytes: usize,
  pub largest_free: usize,
}
