use std::marker::PhantomData;

use log::trace;

use crate::block::{BlockPtr, HEADER_SIZE};

/// Singly linked list of free blocks, threaded through their headers.
///
/// Blocks are always inserted at the head, so list order is
/// most-recently-freed first and says nothing about addresses. Neighbour
/// lookups scan the whole list.
pub struct FreeList {
  head: Option<BlockPtr>,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None }
  }

  /// # Safety
  ///
  /// `block` must have a valid header, must not already be in the list and
  /// must not overlap any block in the list.
  pub unsafe fn push_front(
    &mut self,
    block: BlockPtr,
  ) {
    unsafe { block.set_next(self.head) };
    self.head = Some(block);
  }

  /// Removes `block` by identity. Returns `false` if it was not linked.
  ///
  /// # Safety
  ///
  /// Every block in the list must have a valid header.
  pub unsafe fn unlink(
    &mut self,
    block: BlockPtr,
  ) -> bool {
    unsafe {
      let Some(head) = self.head else {
        return false;
      };

      if head == block {
        self.head = block.next();
        return true;
      }

      let mut current = head;
      while let Some(next) = current.next() {
        if next == block {
          current.set_next(block.next());
          return true;
        }
        current = next;
      }

      false
    }
  }

  /// Free block whose range ends exactly where `block` starts.
  ///
  /// # Safety
  ///
  /// Every block in the list must have a valid header.
  pub unsafe fn find_prev_neighbor(
    &self,
    block: BlockPtr,
  ) -> Option<BlockPtr> {
    let start = block.header().as_ptr();
    unsafe { self.iter() }.find(|candidate| unsafe { candidate.end() == start })
  }

  /// Free block starting exactly where `block`'s range ends.
  ///
  /// # Safety
  ///
  /// `block` and every block in the list must have a valid header.
  pub unsafe fn find_next_neighbor(
    &self,
    block: BlockPtr,
  ) -> Option<BlockPtr> {
    let end = unsafe { block.end() };
    unsafe { self.iter() }.find(|candidate| candidate.header().as_ptr() == end)
  }

  /// First block in list order with at least `size` payload bytes.
  ///
  /// # Safety
  ///
  /// Every block in the list must have a valid header.
  pub unsafe fn first_fit(
    &self,
    size: usize,
  ) -> Option<BlockPtr> {
    unsafe { self.iter() }.find(|candidate| unsafe { candidate.size() >= size })
  }

  /// Merges `block` with the free blocks physically adjacent to it.
  ///
  /// Absorbed blocks are unlinked wherever they sit in the list. If a
  /// previous neighbour exists it absorbs `block` and becomes the working
  /// block, the next-neighbour lookup then uses the merged end address.
  /// `block` itself may or may not be linked. Returns the surviving block,
  /// which keeps whatever list membership it had.
  ///
  /// # Safety
  ///
  /// `block` and every block in the list must have a valid header.
  pub unsafe fn coalesce(
    &mut self,
    block: BlockPtr,
  ) -> BlockPtr {
    unsafe {
      let mut block = block;

      if let Some(prev) = self.find_prev_neighbor(block) {
        self.unlink(block);
        prev.set_size(prev.size() + block.size() + HEADER_SIZE);
        trace!("coalesced {:?} into previous neighbour {:?}", block, prev);
        block = prev;
      }

      if let Some(next) = self.find_next_neighbor(block) {
        self.unlink(next);
        block.set_size(block.size() + next.size() + HEADER_SIZE);
        trace!("coalesced next neighbour {:?} into {:?}", next, block);
      }

      block
    }
  }

  /// Walks the list in order.
  ///
  /// # Safety
  ///
  /// Every block in the list must have a valid header.
  pub unsafe fn iter(&self) -> Iter<'_> {
    Iter {
      next: self.head,
      _list: PhantomData,
    }
  }
}

impl Default for FreeList {
  fn default() -> Self {
    Self::new()
  }
}

pub struct Iter<'a> {
  next: Option<BlockPtr>,
  _list: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
  type Item = BlockPtr;

  fn next(&mut self) -> Option<BlockPtr> {
    let current = self.next?;
    // Headers were vouched for when the iterator was created.
    self.next = unsafe { current.next() };
    Some(current)
  }
}
