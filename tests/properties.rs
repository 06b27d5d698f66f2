use std::ptr::NonNull;

use brkalloc::{Arena, FreeListAllocator, HEADER_SIZE, HeapError};

fn allocator(capacity: usize) -> FreeListAllocator<Arena> {
  FreeListAllocator::new(Arena::with_capacity(capacity).unwrap())
}

fn fill(
  ptr: NonNull<u8>,
  len: usize,
  seed: u8,
) {
  for i in 0..len {
    unsafe { ptr.as_ptr().add(i).write(seed.wrapping_add(i as u8)) };
  }
}

fn holds(
  ptr: NonNull<u8>,
  len: usize,
  seed: u8,
) -> bool {
  (0..len).all(|i| unsafe { *ptr.as_ptr().add(i) } == seed.wrapping_add(i as u8))
}

#[test_log::test]
fn live_regions_never_overlap() {
  let mut allocator = allocator(64 * 1024);
  let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

  for round in 0..200usize {
    let size = 1 + (round * 37) % 113;

    if round % 3 == 2 {
      let (ptr, _) = live.remove((round * 7) % live.len());
      unsafe { allocator.free(Some(ptr)) };
    }

    let ptr = allocator.allocate(size).unwrap();
    assert!(unsafe { allocator.usable_size(ptr) } >= size);
    fill(ptr, size, round as u8);
    live.push((ptr, size));
  }

  for (i, &(a, a_len)) in live.iter().enumerate() {
    for &(b, b_len) in &live[i + 1..] {
      let (a_start, b_start) = (a.as_ptr() as usize, b.as_ptr() as usize);
      assert!(a_start + a_len <= b_start || b_start + b_len <= a_start);
    }
  }
}

#[test_log::test]
fn writes_do_not_leak_into_neighbours() {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(13).unwrap();
  let b = allocator.allocate(7).unwrap();
  let c = allocator.allocate(29).unwrap();

  fill(a, 13, 1);
  fill(b, 7, 50);
  fill(c, 29, 100);

  unsafe { allocator.free(Some(b)) };
  let d = allocator.allocate(5).unwrap();
  fill(d, 5, 200);

  assert!(holds(a, 13, 1));
  assert!(holds(c, 29, 100));
}

#[test_log::test]
fn zero_sized_requests_fail() {
  let mut allocator = allocator(4096);

  assert_eq!(allocator.allocate(0), Err(HeapError::InvalidSize));
  assert_eq!(allocator.allocate_zeroed(0, 16), Err(HeapError::InvalidSize));
  assert_eq!(allocator.allocate_zeroed(16, 0), Err(HeapError::InvalidSize));
  assert_eq!(allocator.allocate_zeroed(usize::MAX / 2, 3), Err(HeapError::InvalidSize));
  assert_eq!(allocator.boundary().used(), 0);
}

#[test_log::test]
fn zeroed_memory_covers_every_element() {
  let mut allocator = allocator(4096);

  let dirty = allocator.allocate(400).unwrap();
  unsafe { dirty.as_ptr().write_bytes(0xFF, 400) };
  let _guard = allocator.allocate(1).unwrap();
  unsafe { allocator.free(Some(dirty)) };

  let zeroed = allocator.allocate_zeroed(25, 12).unwrap();

  assert_eq!(zeroed, dirty);
  assert!((0..300).all(|i| unsafe { *zeroed.as_ptr().add(i) } == 0));
}

#[test_log::test]
fn reallocate_preserves_prefix() {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(48).unwrap();
  fill(a, 48, 9);
  let _guard = allocator.allocate(1).unwrap();

  let b = unsafe { allocator.reallocate(Some(a), 200) }.unwrap();

  assert!(holds(b, 48, 9));
  assert!(unsafe { allocator.usable_size(b) } >= 200);
}

#[test_log::test]
fn reallocate_to_smaller_or_equal_keeps_address() {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(48).unwrap();

  for size in [48, 47, 1] {
    assert_eq!(unsafe { allocator.reallocate(Some(a), size) }, Ok(a));
  }
}

#[test_log::test]
fn freed_block_is_reused() {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(64).unwrap();
  let _guard = allocator.allocate(8).unwrap();
  let end = allocator.heap_end();

  unsafe { allocator.free(Some(a)) };

  assert_eq!(allocator.allocate(64), Ok(a));
  assert_eq!(allocator.heap_end(), end);
}

#[test_log::test]
fn most_recently_freed_is_tried_first() {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(32).unwrap();
  let _s = allocator.allocate(8).unwrap();
  let b = allocator.allocate(32).unwrap();
  let _guard = allocator.allocate(8).unwrap();

  unsafe {
    allocator.free(Some(a));
    allocator.free(Some(b));
  }

  assert_eq!(allocator.allocate(32), Ok(b));
  assert_eq!(allocator.allocate(32), Ok(a));
}

fn coalesce_pair(free_first_block_first: bool) {
  let mut allocator = allocator(4096);

  let a = allocator.allocate(40).unwrap();
  let b = allocator.allocate(24).unwrap();
  let _guard = allocator.allocate(8).unwrap();

  unsafe {
    if free_first_block_first {
      allocator.free(Some(a));
      allocator.free(Some(b));
    } else {
      allocator.free(Some(b));
      allocator.free(Some(a));
    }
  }

  let blocks: Vec<_> = allocator.free_blocks().collect();
  assert_eq!(blocks.len(), 1);
  assert_eq!(blocks[0].payload, a);
  assert_eq!(blocks[0].size, 40 + 24 + HEADER_SIZE);

  let end = allocator.heap_end();
  let merged = allocator.allocate(40 + 24 + HEADER_SIZE).unwrap();

  assert_eq!(merged, a);
  assert_eq!(allocator.heap_end(), end);
}

#[test_log::test]
fn adjacent_blocks_coalesce_in_either_order() {
  coalesce_pair(true);
  coalesce_pair(false);
}

#[test_log::test]
fn freeing_top_block_shrinks_by_block_and_header() {
  let mut allocator = allocator(4096);

  let _a = allocator.allocate(100).unwrap();
  let before = allocator.heap_end() as usize;
  let b = allocator.allocate(77).unwrap();
  let grown = allocator.heap_end() as usize;

  assert_eq!(grown - before, 77 + HEADER_SIZE);

  unsafe { allocator.free(Some(b)) };

  assert_eq!(allocator.heap_end() as usize, before);
  assert_eq!(allocator.stats().free_blocks, 0);
}

#[test_log::test]
fn small_request_splits_freed_block() {
  let mut allocator = allocator(4096);

  let first = allocator.allocate(64).unwrap();
  let _second = allocator.allocate(64).unwrap();
  let end = allocator.heap_end();

  unsafe { allocator.free(Some(first)) };

  assert_eq!(allocator.heap_end(), end);
  assert_eq!(allocator.stats().free_blocks, 1);

  let third = allocator.allocate(32).unwrap();

  assert_eq!(third, first);
  assert_eq!(unsafe { allocator.usable_size(third) }, 32);
  assert_eq!(allocator.heap_end(), end);

  let leftover: Vec<_> = allocator.free_blocks().collect();
  assert_eq!(leftover.len(), 1);
  assert_eq!(leftover[0].size, 64 - 32 - HEADER_SIZE);
  assert!(leftover[0].size > 0);
}

#[test_log::test]
fn exhausted_heap_reports_out_of_memory() {
  let mut allocator = allocator(256);

  let a = allocator.allocate(100).unwrap();
  let end = allocator.heap_end();

  assert_eq!(allocator.allocate(200), Err(HeapError::OutOfMemory));
  assert_eq!(allocator.heap_end(), end);

  unsafe { allocator.free(Some(a)) };

  assert!(allocator.allocate(200).is_ok());
}

#[test_log::test]
fn independent_heaps_do_not_interfere() {
  let mut left = allocator(1024);
  let mut right = allocator(1024);

  let a = left.allocate(32).unwrap();
  let b = right.allocate(32).unwrap();
  let _guard = left.allocate(8).unwrap();

  unsafe { left.free(Some(a)) };

  assert_eq!(left.stats().free_blocks, 1);
  assert_eq!(right.stats().free_blocks, 0);
  assert_ne!(right.allocate(32), Ok(a));
  assert_eq!(unsafe { right.usable_size(b) }, 32);
}
