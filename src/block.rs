use std::{mem, ptr};

use crate::align::WORD;

/// Bytes of metadata in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(HEADER_SIZE % WORD == 0);

/// Payload size and free flag packed into a single word.
///
/// Sizes are always word multiples, so bit 0 is never part of a size and holds
/// the flag instead.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Tag(usize);

impl Tag {
  const FREE: usize = 1;

  pub const fn new(
    size: usize,
    is_free: bool,
  ) -> Self {
    debug_assert!(size & Self::FREE == 0);
    Self((size & !Self::FREE) | is_free as usize)
  }

  pub const fn size(self) -> usize {
    self.0 & !Self::FREE
  }

  pub const fn is_free(self) -> bool {
    self.0 & Self::FREE != 0
  }

  pub const fn with_size(
    self,
    size: usize,
  ) -> Self {
    Self::new(size, self.is_free())
  }

  pub const fn with_free(
    self,
    is_free: bool,
  ) -> Self {
    Self::new(self.size(), is_free)
  }
}

impl std::fmt::Debug for Tag {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Tag")
      .field("size", &self.size())
      .field("is_free", &self.is_free())
      .finish()
  }
}

/// In-place header written immediately before each payload.
///
/// Blocks are linked in address order; `next` of the last block is null.
#[repr(C)]
pub struct Block {
  pub tag: Tag,
  pub prev: *mut Block,
  pub next: *mut Block,
}

impl Block {
  /// Writes a fresh header at `address`.
  ///
  /// # Safety
  /// `address` must be word-aligned and valid for `HEADER_SIZE + size` bytes.
  pub unsafe fn write(
    address: *mut u8,
    size: usize,
    is_free: bool,
    prev: *mut Block,
    next: *mut Block,
  ) -> *mut Block {
    let block = address as *mut Block;
    unsafe {
      block.write(Block {
        tag: Tag::new(size, is_free),
        prev,
        next,
      });
    }
    block
  }

  /// Recovers the header owning a payload pointer.
  pub fn from_payload(payload: *mut u8) -> *mut Block {
    payload.wrapping_sub(HEADER_SIZE) as *mut Block
  }

  pub fn payload(block: *mut Block) -> *mut u8 {
    (block as *mut u8).wrapping_add(HEADER_SIZE)
  }

  /// First address past the block's payload.
  ///
  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn end(block: *mut Block) -> *mut u8 {
    unsafe { Self::payload(block).wrapping_add(Self::size(block)) }
  }

  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn size(block: *mut Block) -> usize {
    unsafe { (*block).tag.size() }
  }

  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn set_size(
    block: *mut Block,
    size: usize,
  ) {
    unsafe { (*block).tag = (*block).tag.with_size(size) }
  }

  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn is_free(block: *mut Block) -> bool {
    unsafe { (*block).tag.is_free() }
  }

  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn set_free(
    block: *mut Block,
    is_free: bool,
  ) {
    unsafe { (*block).tag = (*block).tag.with_free(is_free) }
  }

  /// Whether `next` starts exactly where `block`'s payload ends.
  ///
  /// # Safety
  /// `block` must point at a live header.
  pub unsafe fn is_adjacent(
    block: *mut Block,
    next: *mut Block,
  ) -> bool {
    !next.is_null() && ptr::eq(unsafe { Self::end(block) }, next as *mut u8)
  }
}
