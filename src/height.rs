//! Deterministic tower-height assignment.
//!
//! Heights follow the ruler sequence: the height handed to the `n`-th
//! insertion is one plus the number of consecutive set low bits of `n`.
//! Half of all calls return 1, a quarter return 2, and so on: the same
//! shape as coin flipping, but reproducible from a fixed starting counter
//! and independent between maps, since each map owns its own counter.

use crate::MAX_HEIGHT;

#[derive(Debug, Clone, Default)]
pub(crate) struct LevelChooser {
  counter: u64,
}

impl LevelChooser {
  pub(crate) const fn new() -> Self {
    Self { counter: 0 }
  }

  /// The tower height for the next inserted node, in `1..=MAX_HEIGHT`.
  pub(crate) fn next(&mut self) -> usize {
    let n = self.counter;
    self.counter = self.counter.wrapping_add(1);
    (n.trailing_ones() as usize + 1).min(MAX_HEIGHT)
  }
}
