use std::ptr;

use crate::{block::Block, chain::Chain};

/// Strategy used to pick which free block serves a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchMode {
  /// Smallest free block that is large enough.
  BestFit,
  /// First large-enough free block from the start of the heap.
  #[default]
  FirstFit,
  /// Like first-fit, but resuming where the previous search stopped.
  NextFit,
}

impl Chain {
  /// Finds a free block of at least `size` bytes under `mode` and trims it
  /// down to `size` when the excess can hold another block.
  ///
  /// Returns null when nothing fits.
  ///
  /// # Safety
  /// The chain must be well formed.
  pub unsafe fn find(
    &mut self,
    size: usize,
    mode: SearchMode,
  ) -> *mut Block {
    unsafe {
      let block = match mode {
        SearchMode::BestFit => self.best_fit(size),
        SearchMode::FirstFit => self.first_fit(size),
        SearchMode::NextFit => self.next_fit(size),
      };

      if block.is_null() {
        return block;
      }

      if Self::can_split(block, size) {
        self.split(block, size);
      }

      if mode == SearchMode::NextFit {
        self.cursor = (*block).next;
      }

      block
    }
  }

  unsafe fn fits(
    block: *mut Block,
    size: usize,
  ) -> bool {
    unsafe { Block::is_free(block) && Block::size(block) >= size }
  }

  unsafe fn first_fit(
    &self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      let mut current = self.start;

      while !current.is_null() {
        if Self::fits(current, size) {
          return current;
        }
        current = (*current).next;
      }

      ptr::null_mut()
    }
  }

  unsafe fn best_fit(
    &self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      let mut best: *mut Block = ptr::null_mut();
      let mut current = self.start;

      while !current.is_null() {
        if Self::fits(current, size) && (best.is_null() || Block::size(current) < Block::size(best)) {
          best = current;
        }
        current = (*current).next;
      }

      best
    }
  }

  unsafe fn next_fit(
    &mut self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      if self.cursor.is_null() {
        self.cursor = self.start;
      }

      let origin = self.cursor;
      if origin.is_null() {
        return ptr::null_mut();
      }

      let mut current = origin;
      loop {
        if Self::fits(current, size) {
          return current;
        }

        current = if (*current).next.is_null() { self.start } else { (*current).next };

        if current == origin {
          return ptr::null_mut();
        }
      }
    }
  }
}
