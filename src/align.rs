use std::mem;

/// Granularity every block size and payload address is rounded to.
pub const WORD: usize = mem::size_of::<usize>();

/// Calculates the machine word alignment for the given size.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use fitalloc::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::std::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to a multiple of `alignment`, which must be a power of two.
///
/// ```rust
/// use fitalloc::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Word-aligns `size`, or `None` when rounding up would overflow.
pub fn checked_align(size: usize) -> Option<usize> {
  size.checked_add(WORD - 1).map(|padded| padded & !(WORD - 1))
}

/// Bytes needed to move `address` up to the next word boundary.
pub fn padding_for(address: usize) -> usize {
  align!(address) - address
}
