use std::ptr;

use crate::block::{Block, HEADER_SIZE};

/// Smallest payload a split-off remainder must be able to hold.
///
/// When the excess of a free block cannot host a header plus this many bytes
/// it stays inside the allocated block as internal waste.
pub const MIN_SPLIT_REMAINDER: usize = 0;

/// Address-ordered list of every block in the heap, free or used.
pub struct Chain {
  pub(crate) start: *mut Block,
  pub(crate) top: *mut Block,
  pub(crate) cursor: *mut Block,
}

impl Chain {
  pub const fn new() -> Self {
    Self {
      start: ptr::null_mut(),
      top: ptr::null_mut(),
      cursor: ptr::null_mut(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.start.is_null()
  }

  /// Links a freshly extended block after `top`.
  ///
  /// # Safety
  /// `block` must be a live header that is not yet part of any chain and lies
  /// above every block already linked.
  pub unsafe fn append(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      (*block).prev = self.top;
      (*block).next = ptr::null_mut();

      if self.is_empty() {
        self.start = block;
      } else {
        debug_assert!((self.top as usize) < block as usize);
        (*self.top).next = block;
      }
    }

    self.top = block;
  }

  /// # Safety
  /// `block` must be a live header.
  pub unsafe fn can_split(
    block: *mut Block,
    size: usize,
  ) -> bool {
    size
      .checked_add(HEADER_SIZE + MIN_SPLIT_REMAINDER)
      .is_some_and(|needed| unsafe { Block::size(block) } >= needed)
  }

  /// Shrinks `block` to `size` bytes and links the rest as a new free block.
  ///
  /// # Safety
  /// `block` must belong to this chain, `size` must be word-aligned and
  /// [`Chain::can_split`] must hold.
  pub unsafe fn split(
    &mut self,
    block: *mut Block,
    size: usize,
  ) -> *mut Block {
    unsafe {
      let original = Block::size(block);
      debug_assert!(Self::can_split(block, size));

      Block::set_size(block, size);

      let next = (*block).next;
      let remainder = Block::write(
        Block::end(block),
        original - size - HEADER_SIZE,
        true,
        block,
        next,
      );

      if !next.is_null() {
        (*next).prev = remainder;
      }
      (*block).next = remainder;

      if self.top == block {
        self.top = remainder;
      }

      log::trace!(
        "split {:?}: {} -> {} + free {}",
        block,
        original,
        size,
        Block::size(remainder)
      );

      remainder
    }
  }

  /// # Safety
  /// `block` must belong to this chain.
  pub unsafe fn can_merge(block: *mut Block) -> bool {
    unsafe {
      let next = (*block).next;
      Block::is_adjacent(block, next) && Block::is_free(next)
    }
  }

  /// Absorbs the block following `block` when it is free and adjacent.
  ///
  /// # Safety
  /// `block` must belong to this chain.
  pub unsafe fn merge(
    &mut self,
    block: *mut Block,
  ) -> bool {
    unsafe {
      if !Self::can_merge(block) {
        return false;
      }

      let next = (*block).next;
      let size = Block::size(block) + HEADER_SIZE + Block::size(next);
      Block::set_size(block, size);

      (*block).next = (*next).next;
      if !(*block).next.is_null() {
        (*(*block).next).prev = block;
      }

      if self.top == next {
        self.top = block;
      }
      if self.cursor == next {
        self.cursor = block;
      }

      log::trace!("merged {:?} into {:?}, size {}", next, block, size);
      true
    }
  }

  /// Merges a just-freed block with its free neighbours on both sides and
  /// returns the header that survives.
  ///
  /// # Safety
  /// `block` must be a free block of this chain.
  pub unsafe fn coalesce(
    &mut self,
    block: *mut Block,
  ) -> *mut Block {
    unsafe {
      debug_assert!(Block::is_free(block));

      while self.merge(block) {}

      let mut survivor = block;
      loop {
        let prev = (*survivor).prev;
        if prev.is_null() || !Block::is_free(prev) || !self.merge(prev) {
          break;
        }
        survivor = prev;
      }

      survivor
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{align::WORD, source::{Arena, HeapSource}};

  unsafe fn push(
    chain: &mut Chain,
    arena: &mut Arena,
    size: usize,
    is_free: bool,
  ) -> *mut Block {
    let address = arena.extend(HEADER_SIZE + size).unwrap().as_ptr();
    unsafe {
      let block = Block::write(address, size, is_free, ptr::null_mut(), ptr::null_mut());
      chain.append(block);
      block
    }
  }

  #[test]
  fn test_append_sets_anchors() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();
    assert!(chain.is_empty());

    unsafe {
      let a = push(&mut chain, &mut arena, 2 * WORD, false);
      let b = push(&mut chain, &mut arena, 2 * WORD, false);

      assert_eq!(chain.start, a);
      assert_eq!(chain.top, b);
      assert_eq!((*a).next, b);
      assert_eq!((*b).prev, a);
      assert!((*b).next.is_null());
    }
  }

  #[test]
  fn test_split_threshold() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let block = push(&mut chain, &mut arena, 8 * WORD, true);

      assert!(Chain::can_split(block, 8 * WORD - HEADER_SIZE));
      assert!(!Chain::can_split(block, 8 * WORD - HEADER_SIZE + WORD));
      assert!(!Chain::can_split(block, usize::MAX - WORD + 1));
    }
  }

  #[test]
  fn test_split_moves_top() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let block = push(&mut chain, &mut arena, 16 * WORD, true);
      let remainder = chain.split(block, 4 * WORD);

      assert_eq!(Block::size(block), 4 * WORD);
      assert_eq!(Block::size(remainder), 12 * WORD - HEADER_SIZE);
      assert!(Block::is_free(remainder));
      assert!(Block::is_adjacent(block, remainder));
      assert_eq!(chain.top, remainder);
      assert_eq!(Block::end(remainder), Block::payload(block).add(16 * WORD));
    }
  }

  #[test]
  fn test_split_in_the_middle_relinks() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let a = push(&mut chain, &mut arena, 16 * WORD, true);
      let b = push(&mut chain, &mut arena, 2 * WORD, false);
      let remainder = chain.split(a, 2 * WORD);

      assert_eq!((*a).next, remainder);
      assert_eq!((*remainder).next, b);
      assert_eq!((*b).prev, remainder);
      assert_eq!(chain.top, b);
      assert!(Block::is_adjacent(remainder, b));
    }
  }

  #[test]
  fn test_merge_requires_free_neighbour() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let a = push(&mut chain, &mut arena, 2 * WORD, true);
      let b = push(&mut chain, &mut arena, 2 * WORD, false);

      assert!(!chain.merge(a));

      Block::set_free(b, true);
      assert!(chain.merge(a));
      assert_eq!(Block::size(a), 4 * WORD + HEADER_SIZE);
      assert_eq!(chain.top, a);
      assert!((*a).next.is_null());
    }
  }

  #[test]
  fn test_merge_skips_gap() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let a = push(&mut chain, &mut arena, 2 * WORD, true);
      arena.extend(WORD).unwrap();
      push(&mut chain, &mut arena, 2 * WORD, true);

      assert!(!chain.merge(a));
    }
  }

  #[test]
  fn test_coalesce_both_directions() {
    let mut arena = Arena::with_capacity(1024);
    let mut chain = Chain::new();

    unsafe {
      let a = push(&mut chain, &mut arena, 2 * WORD, true);
      let b = push(&mut chain, &mut arena, 4 * WORD, false);
      let c = push(&mut chain, &mut arena, 2 * WORD, true);
      let d = push(&mut chain, &mut arena, 2 * WORD, false);

      chain.cursor = c;
      Block::set_free(b, true);
      let survivor = chain.coalesce(b);

      assert_eq!(survivor, a);
      assert_eq!(Block::size(a), 8 * WORD + 2 * HEADER_SIZE);
      assert_eq!((*a).next, d);
      assert_eq!((*d).prev, a);
      assert_eq!(chain.cursor, a);
      assert_eq!(chain.top, d);
    }
  }
}
