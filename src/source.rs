//! Where heap memory comes from.
//!
//! A [`HeapSource`] hands out fresh, word-aligned bytes at the end of the
//! managed region. The region only ever grows.

use std::{alloc, ptr::NonNull};

use crate::{config::HeapConfig, error::AllocError};

/// Alignment of an arena reservation; comfortably above the word size.
const ARENA_ALIGN: usize = 16;

pub trait HeapSource {
  /// Grows the managed region by exactly `size` bytes and returns the start of
  /// the new bytes.
  ///
  /// The returned address is word-aligned and is never handed out twice.
  fn extend(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError>;
}

/// The process program break, moved with `sbrk(2)`.
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct Sbrk;

#[cfg(unix)]
impl Sbrk {
  pub const fn new() -> Self {
    Self
  }

  /// Current program break, as reported by `sbrk(0)`.
  pub fn current_break() -> *mut u8 {
    unsafe { libc::sbrk(0) as *mut u8 }
  }
}

#[cfg(unix)]
impl HeapSource for Sbrk {
  fn extend(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    use libc::{c_void, intptr_t, sbrk};

    let exhausted = AllocError::Exhausted { requested: size };

    // Someone else may have left the break unaligned.
    let padding = crate::align::padding_for(Self::current_break() as usize);
    let total = size.checked_add(padding).ok_or(exhausted)?;
    let increment = intptr_t::try_from(total).map_err(|_| exhausted)?;

    let address = unsafe { sbrk(increment) };

    if address == usize::MAX as *mut c_void {
      log::warn!("sbrk({}) failed", increment);
      return Err(exhausted);
    }

    let start = (address as *mut u8).wrapping_add(padding);
    log::debug!("sbrk extended by {} bytes at {:?}", total, start);

    NonNull::new(start).ok_or(exhausted)
  }
}

/// Fixed-capacity region emulating a program break.
///
/// The backing memory is reserved once, on the first extension, and freed when
/// the arena is dropped.
#[derive(Debug)]
pub struct Arena {
  base: *mut u8,
  capacity: usize,
  cursor: usize,
}

// The arena exclusively owns its reservation.
unsafe impl Send for Arena {}

impl Arena {
  pub const fn new() -> Self {
    Self::with_capacity(crate::config::DEFAULT_ARENA_CAPACITY)
  }

  pub const fn with_capacity(capacity: usize) -> Self {
    Self {
      base: std::ptr::null_mut(),
      capacity,
      cursor: 0,
    }
  }

  pub fn from_config(config: &HeapConfig) -> Self {
    Self::with_capacity(config.arena_capacity)
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.cursor
  }

  fn layout(&self) -> Option<alloc::Layout> {
    alloc::Layout::from_size_align(self.capacity, ARENA_ALIGN).ok()
  }

  fn reserve(&mut self) -> Result<(), AllocError> {
    let failed = AllocError::Exhausted { requested: self.capacity };

    let layout = match self.layout() {
      Some(layout) if layout.size() > 0 => layout,
      _ => return Err(failed),
    };

    let base = unsafe { alloc::alloc(layout) };
    if base.is_null() {
      log::warn!("arena reservation of {} bytes failed", self.capacity);
      return Err(failed);
    }

    log::debug!("arena reserved {} bytes at {:?}", self.capacity, base);
    self.base = base;
    Ok(())
  }
}

impl Default for Arena {
  fn default() -> Self {
    Self::new()
  }
}

impl HeapSource for Arena {
  fn extend(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if self.base.is_null() {
      self.reserve()?;
    }

    let exhausted = AllocError::Exhausted { requested: size };

    let aligned = crate::align::checked_align(size).ok_or(exhausted)?;
    let end = self.cursor.checked_add(aligned).ok_or(exhausted)?;
    if end > self.capacity {
      log::warn!(
        "arena exhausted: {} + {} exceeds capacity {}",
        self.cursor,
        aligned,
        self.capacity
      );
      return Err(exhausted);
    }

    let start = unsafe { self.base.add(self.cursor) };
    self.cursor = end;

    NonNull::new(start).ok_or(exhausted)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    if self.base.is_null() {
      return;
    }

    if let Some(layout) = self.layout() {
      unsafe { alloc::dealloc(self.base, layout) };
    }
  }
}

/// Source used by the process-wide allocator.
#[cfg(unix)]
pub type Platform = Sbrk;

#[cfg(not(unix))]
pub type Platform = Arena;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::WORD;

  #[test]
  fn test_arena_is_contiguous() {
    let mut arena = Arena::with_capacity(256);

    let first = arena.extend(32).unwrap();
    let second = arena.extend(3 * WORD).unwrap();

    assert_eq!(first.as_ptr() as usize % WORD, 0);
    assert_eq!(second.as_ptr() as usize, first.as_ptr() as usize + 32);
    assert_eq!(arena.used(), 32 + 3 * WORD);
  }

  #[test]
  fn test_arena_exhaustion_is_an_error() {
    let mut arena = Arena::with_capacity(64);

    assert!(arena.extend(48).is_ok());
    assert_eq!(arena.extend(32), Err(AllocError::Exhausted { requested: 32 }));
    assert_eq!(arena.used(), 48);

    // What is left can still be handed out.
    assert!(arena.extend(16).is_ok());
    assert_eq!(arena.extend(1), Err(AllocError::Exhausted { requested: 1 }));
  }

  #[test]
  fn test_arena_rejects_overflowing_request() {
    let mut arena = Arena::with_capacity(64);

    assert_eq!(
      arena.extend(usize::MAX),
      Err(AllocError::Exhausted { requested: usize::MAX })
    );
  }

  #[test]
  fn test_empty_arena_cannot_reserve() {
    let mut arena = Arena::with_capacity(0);

    assert!(arena.extend(8).is_err());
  }

  #[test]
  fn test_arena_from_config() {
    let config = HeapConfig {
      arena_capacity: 4096,
      ..HeapConfig::default()
    };

    assert_eq!(Arena::from_config(&config).capacity(), 4096);
  }

  #[cfg(unix)]
  #[test]
  fn test_sbrk_moves_break() {
    let mut sbrk = Sbrk::new();

    let start = sbrk.extend(64).unwrap();

    assert_eq!(start.as_ptr() as usize % WORD, 0);
    assert!(Sbrk::current_break() as usize >= start.as_ptr() as usize + 64);
  }

  #[cfg(unix)]
  #[test]
  fn test_sbrk_rejects_huge_request() {
    let mut sbrk = Sbrk::new();

    assert_eq!(
      sbrk.extend(usize::MAX),
      Err(AllocError::Exhausted { requested: usize::MAX })
    );
  }
}
