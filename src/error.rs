use thiserror::Error;

/// Reasons an allocation request cannot be served.
///
/// None of these leave the heap in an inconsistent state: the request is
/// rejected before any block is touched, so later (smaller) requests still work.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("zero-sized allocation request")]
  ZeroSize,

  #[error("allocation of {size} bytes overflows the address space")]
  TooLarge { size: usize },

  #[error("array allocation of {count} x {size} bytes overflows usize")]
  ArrayTooLarge { count: usize, size: usize },

  #[error("heap exhausted: cannot extend by {requested} bytes")]
  Exhausted { requested: usize },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    assert_eq!(AllocError::ZeroSize.to_string(), "zero-sized allocation request");
    assert_eq!(
      AllocError::Exhausted { requested: 48 }.to_string(),
      "heap exhausted: cannot extend by 48 bytes"
    );
    assert_eq!(
      AllocError::ArrayTooLarge { count: 2, size: usize::MAX }.to_string(),
      format!("array allocation of 2 x {} bytes overflows usize", usize::MAX)
    );
  }
}
