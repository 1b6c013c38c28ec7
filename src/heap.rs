use std::{marker::PhantomData, ptr::{self, NonNull}};

use crate::{
  align::checked_align,
  block::{Block, HEADER_SIZE},
  chain::Chain,
  config::HeapConfig,
  error::AllocError,
  search::SearchMode,
  source::HeapSource,
};

/// Snapshot of one block, as seen by [`Heap::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// 1-based position in the chain.
  pub index: usize,
  pub address: *const u8,
  pub size: usize,
  pub is_free: bool,
}

/// Aggregate occupancy of a heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  /// Payload bytes held by used blocks.
  pub used_bytes: usize,
  /// Payload bytes held by free blocks.
  pub free_bytes: usize,
  pub largest_free: usize,
  /// Total bytes obtained from the source, headers included.
  pub extended_bytes: usize,
  /// Number of successful calls into the source.
  pub extensions: usize,
}

/// A growable heap of variable-sized blocks carved from a [`HeapSource`].
///
/// Every operation runs to completion under `&mut self`; wrap the heap in a
/// lock to share it (see [`crate::global`]).
pub struct Heap<S: HeapSource> {
  source: S,
  chain: Chain,
  mode: SearchMode,
  extended_bytes: usize,
  extensions: usize,
}

// Every block reachable from the chain lives in memory owned by `source`.
unsafe impl<S: HeapSource + Send> Send for Heap<S> {}

impl<S: HeapSource> Heap<S> {
  pub const fn new(source: S) -> Self {
    Self {
      source,
      chain: Chain::new(),
      mode: SearchMode::FirstFit,
      extended_bytes: 0,
      extensions: 0,
    }
  }

  pub fn with_config(
    source: S,
    config: &HeapConfig,
  ) -> Self {
    let mut heap = Self::new(source);
    heap.mode = config.search_mode;
    heap
  }

  pub fn mode(&self) -> SearchMode {
    self.mode
  }

  /// Switches the block-selection policy for subsequent searches.
  ///
  /// The next-fit cursor is reset, so a later next-fit search starts over from
  /// the beginning of the heap.
  pub fn select_mode(
    &mut self,
    mode: SearchMode,
  ) {
    log::debug!("search mode {:?} -> {:?}", self.mode, mode);
    self.mode = mode;
    self.chain.cursor = ptr::null_mut();
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Allocates at least `size` bytes, word-aligned.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let size = checked_align(size).ok_or(AllocError::TooLarge { size })?;

    unsafe {
      let block = self.chain.find(size, self.mode);

      let block = if block.is_null() { self.extend(size)? } else { block };
      Block::set_free(block, false);

      log::trace!("allocate({}) -> {:?} [{}]", size, block, Block::size(block));
      Ok(NonNull::new_unchecked(Block::payload(block)))
    }
  }

  /// Appends a fresh block of exactly `size` payload bytes at the top.
  unsafe fn extend(
    &mut self,
    size: usize,
  ) -> Result<*mut Block, AllocError> {
    let total = size
      .checked_add(HEADER_SIZE)
      .ok_or(AllocError::TooLarge { size })?;

    let address = self.source.extend(total)?;
    self.extended_bytes += total;
    self.extensions += 1;

    unsafe {
      let block = Block::write(address.as_ptr(), size, false, ptr::null_mut(), ptr::null_mut());
      self.chain.append(block);
      Ok(block)
    }
  }

  /// Allocates `count * size` zeroed bytes.
  ///
  /// A product that overflows `usize` is rejected rather than wrapped.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count
      .checked_mul(size)
      .ok_or(AllocError::ArrayTooLarge { count, size })?;

    let payload = self.allocate(total)?;

    unsafe {
      let capacity = Block::size(Block::from_payload(payload.as_ptr()));
      ptr::write_bytes(payload.as_ptr(), 0, capacity);
    }

    Ok(payload)
  }

  /// Grows an allocation to at least `new_size` bytes, moving it if needed.
  ///
  /// A block that is already large enough is returned as is; blocks are never
  /// shrunk. When a move is needed but the new allocation fails, the original
  /// block is left untouched.
  ///
  /// # Safety
  /// `payload` must be `None` or a live allocation of this heap.
  pub unsafe fn resize(
    &mut self,
    payload: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(payload) = payload else {
      return self.allocate(new_size);
    };

    unsafe {
      let old_size = self.capacity(payload);
      if new_size <= old_size {
        return Ok(payload);
      }

      let moved = self.allocate(new_size)?;
      ptr::copy_nonoverlapping(payload.as_ptr(), moved.as_ptr(), old_size.min(new_size));
      self.release(Some(payload));

      log::trace!("resize {:?} -> {:?} ({} -> {})", payload, moved, old_size, new_size);
      Ok(moved)
    }
  }

  /// Returns a block to the heap, merging it with free neighbours.
  ///
  /// # Safety
  /// `payload` must be `None` or a live allocation of this heap. Releasing the
  /// same allocation twice is undefined behaviour.
  pub unsafe fn release(
    &mut self,
    payload: Option<NonNull<u8>>,
  ) {
    let Some(payload) = payload else {
      return;
    };

    unsafe {
      let block = Block::from_payload(payload.as_ptr());
      debug_assert!(!Block::is_free(block), "double release of {:?}", payload);

      Block::set_free(block, true);
      let survivor = self.chain.coalesce(block);

      log::trace!("release {:?} -> free {:?} [{}]", block, survivor, Block::size(survivor));
    }
  }

  /// Usable bytes of an allocation, which may exceed what was requested.
  ///
  /// # Safety
  /// `payload` must be a live allocation of this heap.
  pub unsafe fn capacity(
    &self,
    payload: NonNull<u8>,
  ) -> usize {
    unsafe { Block::size(Block::from_payload(payload.as_ptr())) }
  }

  /// Walks every block from the start of the heap to the top.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      current: self.chain.start,
      index: 0,
      _heap: PhantomData,
    }
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats {
      extended_bytes: self.extended_bytes,
      extensions: self.extensions,
      ..HeapStats::default()
    };

    for block in self.blocks() {
      stats.blocks += 1;

      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.used_bytes += block.size;
      }
    }

    stats
  }

  /// Prints every block of the heap to stdout.
  #[cfg(feature = "dump")]
  pub fn dump(&self) {
    println!("\n -----[ Heap status ]-----");
    for block in self.blocks() {
      println!(
        " [+] Block {}:\taddress {:?}\tsize {}\tfree {}",
        block.index, block.address, block.size, block.is_free
      );
    }
  }
}

/// Iterator returned by [`Heap::blocks`].
pub struct Blocks<'a> {
  current: *mut Block,
  index: usize,
  _heap: PhantomData<&'a Chain>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    self.index += 1;

    unsafe {
      self.current = (*block).next;

      Some(BlockInfo {
        index: self.index,
        address: block as *const u8,
        size: Block::size(block),
        is_free: Block::is_free(block),
      })
    }
  }
}
