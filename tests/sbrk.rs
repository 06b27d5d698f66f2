//! Exercises the real program break.
//!
//! The platform allocator may move the break too, so nothing here assumes a
//! freed block is still at the top of the heap. `sbrk` is not thread-safe,
//! hence a single test driving every scenario in sequence.

#![cfg(all(unix, feature = "sbrk"))]

use std::ptr;

use brkalloc::{FreeListAllocator, Sbrk, global};

fn sbrk_heap_round_trip() {
  let mut allocator = FreeListAllocator::new(Sbrk);

  let a = allocator.allocate(64).unwrap();
  let b = allocator.allocate(6 * 2).unwrap();

  unsafe {
    a.as_ptr().write_bytes(0x11, 64);
    for i in 0..6u16 {
      b.cast::<u16>().as_ptr().add(i as usize).write_unaligned(i + 1);
    }

    assert!((0..64).all(|i| *a.as_ptr().add(i) == 0x11));
    assert!((0..6u16).all(|i| b.cast::<u16>().as_ptr().add(i as usize).read_unaligned() == i + 1));

    allocator.free(Some(a));

    let c = allocator.allocate(32).unwrap();
    assert_eq!(c, a);
    assert_eq!(allocator.usable_size(c), 32);

    let grown = allocator.reallocate(Some(b), 256).unwrap();
    assert!((0..6u16).all(|i| grown.cast::<u16>().as_ptr().add(i as usize).read_unaligned() == i + 1));

    allocator.free(Some(grown));
    allocator.free(Some(c));
  }
}

fn global_entry_points() {
  assert!(global::allocate(0).is_null());
  assert!(global::allocate_zeroed(0, 4).is_null());
  assert!(global::allocate_zeroed(usize::MAX, 2).is_null());

  unsafe {
    global::free(ptr::null_mut());

    let zeroed = global::allocate_zeroed(16, 4);
    assert!(!zeroed.is_null());
    assert!((0..64).all(|i| *zeroed.add(i) == 0));

    zeroed.write_bytes(0x7F, 64);
    let same = global::reallocate(zeroed, 10);
    assert_eq!(same, zeroed);

    let moved = global::reallocate(zeroed, 128);
    assert!(!moved.is_null());
    assert!((0..64).all(|i| *moved.add(i) == 0x7F));

    let fresh = global::reallocate(ptr::null_mut(), 8);
    assert!(!fresh.is_null());

    global::free(fresh);
    global::free(moved);
  }

  assert!(!global::heap_end().is_null());
}

#[test_log::test]
fn program_break_heaps() {
  sbrk_heap_round_trip();
  global_entry_points();
}
