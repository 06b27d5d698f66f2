use std::fmt;

/// Reasons an allocation request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  /// Zero-sized request, zero element count, or a size computation that
  /// overflows `usize`.
  InvalidSize,
  /// The heap boundary could not be extended.
  OutOfMemory,
}

impl fmt::Display for HeapError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      HeapError::InvalidSize => f.write_str("invalid allocation size"),
      HeapError::OutOfMemory => f.write_str("heap boundary cannot be extended"),
    }
  }
}

impl std::error::Error for HeapError {}
