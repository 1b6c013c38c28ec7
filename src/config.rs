use crate::search::SearchMode;

/// Capacity reserved by an [`Arena`](crate::Arena) unless configured otherwise.
pub const DEFAULT_ARENA_CAPACITY: usize = 1024 * 1024;

/// Configuration for a [`Heap`](crate::Heap) and the arena backing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Block-selection policy used until [`Heap::select_mode`](crate::Heap::select_mode)
  /// switches it. Default: first-fit.
  pub search_mode: SearchMode,

  /// Bytes an arena reserves up front; extension beyond this fails.
  /// Ignored by `Sbrk`. Default: 1 MiB.
  pub arena_capacity: usize,
}

impl HeapConfig {
  pub const DEFAULT: Self = Self {
    search_mode: SearchMode::FirstFit,
    arena_capacity: DEFAULT_ARENA_CAPACITY,
  };
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}
