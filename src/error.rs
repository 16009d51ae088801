/// Error type for the rankmap crate.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// Indicates that the node arena has run out of ids and cannot admit
  /// another entry. The arena addresses nodes with `u32` ids, so this
  /// only happens once the map has held on the order of four billion
  /// entries at the same time.
  #[error("allocation failed because the node arena is full")]
  Full,
}
