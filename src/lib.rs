//! # fitalloc - A Free-List Memory Allocator
//!
//! This crate provides a `malloc`/`calloc`/`realloc`/`free` replacement that
//! manages a single growing heap, built on the `sbrk` system call (or on a
//! fixed-size arena where `sbrk` is unavailable).
//!
//! ## Overview
//!
//! Memory is obtained from the OS in pieces exactly as large as the request
//! that needed it. Released blocks stay in the heap and are reused by later
//! requests, split when they are too large and merged with free neighbours
//! when released:
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌─────┬─────┬───────────┬─────┬──────────┐                         │
//!   │   │ A1  │ A2  │   free    │ A4  │   free   │                         │
//!   │   └─────┴─────┴───────────┴─────┴──────────┘                         │
//!   │   ▲                                        ▲                    ▲    │
//!   │   │                                        │                    │    │
//!   │  start                                    top               Program  │
//!   │                                                              Break   │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Blocks are chained in address order, free and used alike.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block header with packed size and free flag
//!   ├── chain      - Address-ordered block list, split and merge
//!   ├── config     - HeapConfig
//!   ├── error      - AllocError
//!   ├── global     - Process-wide malloc/calloc/realloc/free
//!   ├── heap       - Heap: the allocator over one source
//!   ├── search     - SearchMode: best-fit, first-fit, next-fit
//!   └── source     - HeapSource: Sbrk and Arena
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{Arena, Heap, SearchMode};
//!
//! let mut heap = Heap::new(Arena::with_capacity(4096));
//! heap.select_mode(SearchMode::BestFit);
//!
//! let ptr = heap.allocate(8).unwrap().as_ptr() as *mut u64;
//!
//! unsafe {
//!     *ptr = 42;
//!     assert_eq!(*ptr, 42);
//!
//!     heap.release(std::ptr::NonNull::new(ptr as *mut u8));
//! }
//! ```
//!
//! Or through the process-wide heap:
//!
//! ```rust
//! unsafe {
//!     let data = fitalloc::malloc(16);
//!     assert!(!data.is_null());
//!     fitalloc::free(data);
//! }
//! ```
//!
//! ## How It Works
//!
//! Each block carries a header right before the pointer handed out:
//!
//! ```text
//!   Single Block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size | free bit │  │  ┌──────────────────────────┐  │
//!   │  │ prev: ptr/null  │  │  │                          │  │
//!   │  │ next: ptr/null  │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │      24 bytes         │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! Allocation searches the chain for a free block under the active
//! [`SearchMode`]. A hit with room for another header is split:
//!
//! ```text
//!   ┌────────┬──────────────────────────┐      ┌────────┬───────┬────────┬─────────┐
//!   │ header │        free, 96          │  ->  │ header │ 32    │ header │ free 40 │
//!   └────────┴──────────────────────────┘      └────────┴───────┴────────┴─────────┘
//! ```
//!
//! A miss extends the heap by the aligned size plus one header. Releasing a
//! block merges it with a free successor and a free predecessor.
//!
//! ## Limitations
//!
//! - **Memory is never returned to the OS**: the heap only grows
//! - **Word alignment only**: payloads are aligned to `size_of::<usize>()`
//! - **Coarse locking**: the global heap is a single spin lock
//!
//! ## Safety
//!
//! Releasing a pointer twice, releasing a foreign pointer or writing past a
//! block's capacity is undefined behaviour, exactly as with the C primitives.

pub mod align;
mod block;
mod chain;
mod config;
mod error;
pub mod global;
mod heap;
mod search;
mod source;

pub use block::HEADER_SIZE;
pub use chain::MIN_SPLIT_REMAINDER;
pub use config::{DEFAULT_ARENA_CAPACITY, HeapConfig};
pub use error::AllocError;
#[cfg(feature = "dump")]
pub use global::print_memory;
pub use global::{calloc, free, malloc, realloc, select_mode};
pub use heap::{BlockInfo, Blocks, Heap, HeapStats};
pub use search::SearchMode;
#[cfg(unix)]
pub use source::Sbrk;
pub use source::{Arena, HeapSource, Platform};
