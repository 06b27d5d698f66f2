//! # brkalloc - A First-Fit Free-List Allocator
//!
//! This crate provides a general-purpose **free-list allocator** that grows a
//! single contiguous heap by moving a program break, and gives memory back
//! when the most recently carved block is released.
//!
//! ## Overview
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌──────┬──────┬──────┬──────┬──────┐                               │
//!   │   │  A1  │  F1  │  A2  │  F2  │  A3  │      (beyond the break)       │
//!   │   └──────┴──┬───┴──────┴──┬───┴──────┘                               │
//!   │             │      ▲      │           ▲                              │
//!   │             └──────┼──────┘           │                              │
//!   │        free list: head → F2 → F1   Program                           │
//!   │                                     Break                            │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   A = allocated, F = free. The free list is threaded through the
//!   headers of free blocks, most recently freed first.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - ALIGNMENT constant and align_up! macro
//!   ├── block      - Block header and splitting (internal)
//!   ├── boundary   - HeapBoundary trait, Sbrk and Arena
//!   ├── error      - HeapError
//!   ├── free_list  - Free list navigation and coalescing (internal)
//!   ├── global     - Process-wide heap on sbrk
//!   ├── heap       - FreeListAllocator
//!   └── locked     - LockedHeap
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brkalloc::{Arena, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::new(Arena::with_capacity(4096).unwrap());
//!
//! let ptr = allocator.allocate(64).unwrap();
//!
//! unsafe {
//!     ptr.as_ptr().write_bytes(0x2A, 64);
//!     allocator.free(Some(ptr));
//! }
//! ```
//!
//! ## How It Works
//!
//! Every block starts with a header:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ next: free link │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   │    HEADER_SIZE bytes  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! - **Allocation** walks the free list and takes the first block that is
//!   large enough, splitting off the tail when it can hold another header.
//!   If nothing fits, the heap grows by `size + HEADER_SIZE`.
//! - **Release** of a block that ends at the break shrinks the heap.
//!   Any other block is pushed on the free list and merged with the free
//!   blocks physically next to it.
//!
//! ## Limitations
//!
//! - **No alignment**: sizes are not rounded, payloads may be unaligned.
//! - **O(n) neighbour search**: the free list has no address index.
//! - **Single-threaded core**: `FreeListAllocator` is unsynchronised; use
//!   `LockedHeap` to share one.
//! - **Shared break**: `Sbrk` competes with anything else in the process that
//!   moves the program break.
//!
//! ## Safety
//!
//! Releasing and resizing take raw pointers and are `unsafe`: the pointer
//! must come from the same allocator and must still be live.

pub mod align;
mod block;
mod boundary;
mod error;
mod free_list;
#[cfg(all(unix, feature = "sbrk"))]
pub mod global;
mod heap;
mod locked;

pub use block::HEADER_SIZE;
#[cfg(all(unix, feature = "sbrk"))]
pub use boundary::Sbrk;
pub use boundary::{Arena, HeapBoundary};
pub use error::HeapError;
pub use heap::{FreeBlock, FreeBlocks, FreeListAllocator, HeapStats};
pub use locked::LockedHeap;
