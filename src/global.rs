//! Process-wide heap with a `malloc`-style interface.
//!
//! Every function takes the same lock for its whole duration, so callers on
//! different threads never observe a block half-split or half-merged.
//! Failures are reported as null pointers, never as panics.

use std::ptr::{self, NonNull};

use spin::Mutex;

use crate::{
  heap::{Heap, HeapStats},
  search::SearchMode,
  source::Platform,
};

static HEAP: Mutex<Heap<Platform>> = Mutex::new(Heap::new(Platform::new()));

fn or_null(result: Result<NonNull<u8>, crate::AllocError>) -> *mut u8 {
  match result {
    Ok(payload) => payload.as_ptr(),
    Err(error) => {
      log::debug!("{}", error);
      ptr::null_mut()
    }
  }
}

/// Allocates `size` bytes. Returns null for `size == 0` or when the heap
/// cannot grow.
pub fn malloc(size: usize) -> *mut u8 {
  or_null(HEAP.lock().allocate(size))
}

/// Allocates `n * size` zeroed bytes. Returns null when the product overflows.
pub fn calloc(
  n: usize,
  size: usize,
) -> *mut u8 {
  or_null(HEAP.lock().zero_allocate(n, size))
}

/// # Safety
/// `data` must be null or a live pointer returned by this module.
pub unsafe fn realloc(
  data: *mut u8,
  new_size: usize,
) -> *mut u8 {
  or_null(unsafe { HEAP.lock().resize(NonNull::new(data), new_size) })
}

/// # Safety
/// `data` must be null or a live pointer returned by this module.
pub unsafe fn free(data: *mut u8) {
  unsafe { HEAP.lock().release(NonNull::new(data)) }
}

pub fn select_mode(mode: SearchMode) {
  HEAP.lock().select_mode(mode);
}

pub fn stats() -> HeapStats {
  HEAP.lock().stats()
}

#[cfg(feature = "dump")]
pub fn print_memory() {
  HEAP.lock().dump();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_malloc_free_round_trip() {
    unsafe {
      assert!(malloc(0).is_null());
      free(ptr::null_mut());

      let data = malloc(10 * std::mem::size_of::<i32>()) as *mut i32;
      assert!(!data.is_null());

      for i in 0..10 {
        data.add(i).write(i as i32);
      }
      for i in 0..10 {
        assert_eq!(data.add(i).read(), i as i32);
      }

      let grown = realloc(data as *mut u8, 40 * std::mem::size_of::<i32>()) as *mut i32;
      assert!(!grown.is_null());
      for i in 0..10 {
        assert_eq!(grown.add(i).read(), i as i32);
      }

      free(grown as *mut u8);
    }
  }

  #[test]
  fn test_calloc_zeroes_and_rejects_overflow() {
    unsafe {
      assert!(calloc(usize::MAX, 16).is_null());

      let data = calloc(8, 8);
      assert!(!data.is_null());
      assert!(std::slice::from_raw_parts(data, 64).iter().all(|&b| b == 0));
      free(data);
    }
  }

  #[test]
  fn test_realloc_null_allocates() {
    unsafe {
      let data = realloc(ptr::null_mut(), 24);
      assert!(!data.is_null());
      assert!(stats().blocks >= 1);
      free(data);
    }
  }
}
