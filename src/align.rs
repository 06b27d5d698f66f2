/// Alignment of the arena backing buffer.
///
/// Allocation sizes are *not* rounded to this value: a request for 13 bytes
/// records 13 bytes and the next header starts right after them. Payload
/// pointers therefore carry no alignment guarantee beyond the one the heap
/// base happens to have.
pub const ALIGNMENT: usize = 16;

/// Rounds `$value` up to the next multiple of [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use brkalloc::align_up;
///
/// assert_eq!(align_up!(1), 16);
/// assert_eq!(align_up!(16), 16);
/// assert_eq!(align_up!(17), 32);
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}
