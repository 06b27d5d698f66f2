use std::io::Read;

use brkalloc::{FreeListAllocator, Sbrk};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap` or
/// `gdb` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn report(
  label: &str,
  allocator: &FreeListAllocator<Sbrk>,
) {
  let sizes: Vec<usize> = allocator.free_blocks().map(|block| block.size).collect();
  println!(
    "[{}] PID = {}, program break = {:?}, free list = {:?}",
    label,
    std::process::id(),
    allocator.heap_end(),
    sizes,
  );
}

fn main() {
  SimpleLogger::new().with_level(LevelFilter::Trace).init().unwrap();

  let mut allocator = FreeListAllocator::new(Sbrk);

  report("start", &allocator);
  block_until_enter_pressed();

  // Two blocks side by side, each growing the heap.
  let first = allocator.allocate(64).unwrap();
  let second = allocator.allocate(64).unwrap();
  println!("\n[1] first = {:p}, second = {:p}", first, second);
  report("1", &allocator);
  block_until_enter_pressed();

  // `first` is not at the break: it lands on the free list.
  unsafe { allocator.free(Some(first)) };
  println!("\n[2] freed first");
  report("2", &allocator);
  block_until_enter_pressed();

  // 32 bytes fit in the freed block; the tail is split off.
  let third = allocator.allocate(32).unwrap();
  println!(
    "\n[3] third = {:p} ({})",
    third,
    if third == first { "reused first" } else { "fresh memory" }
  );
  report("3", &allocator);
  block_until_enter_pressed();

  // Freeing `third` merges it with the split-off tail.
  unsafe { allocator.free(Some(third)) };
  println!("\n[4] freed third");
  report("4", &allocator);
  block_until_enter_pressed();

  // `second` ends at the break, so the heap shrinks.
  unsafe { allocator.free(Some(second)) };
  println!("\n[5] freed second");
  report("5", &allocator);

  println!("\n[6] End of walk. The OS reclaims the rest at exit.");
}
