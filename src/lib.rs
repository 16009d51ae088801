#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

#[cfg(feature = "std")]
extern crate std;

use core::cmp;

mod arena;
mod error;
mod height;
mod iter;
mod list;
mod node;

pub use error::Error;
pub use iter::Iter;
pub use list::SkipMap;

/// The fixed ceiling on tower heights.
///
/// No node ever participates in more than this many levels, which bounds
/// the cost of a search ladder at `MAX_HEIGHT` descents plus the forward
/// steps taken on each level.
pub const MAX_HEIGHT: usize = 20;

/// Key comparison logic for a [`SkipMap`].
///
/// The comparator decides the ascending order the map maintains, and
/// thereby what rank `n` means. Equal keys (by the comparator) may coexist
/// in the map; see [`SkipMap::insert`].
pub trait Comparator<K> {
  /// Compares two keys.
  fn compare(&self, a: &K, b: &K) -> cmp::Ordering;
}

/// Adapts a plain comparison function into a [`Comparator`].
///
/// ```rust
/// use rankmap::{CompareFn, SkipMap};
///
/// // Order by absolute value.
/// let mut map = SkipMap::with_comparator(CompareFn::new(|a: &i32, b: &i32| a.abs().cmp(&b.abs())));
/// for k in [-5, 2, -1] {
///   map.insert(k, ()).unwrap();
/// }
/// assert_eq!(map.key_at(1), Some(&-1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompareFn<F>(F);

impl<F> CompareFn<F> {
  /// Wraps the given comparison function.
  #[inline]
  pub const fn new(f: F) -> Self {
    Self(f)
  }
}

impl<K, F> Comparator<K> for CompareFn<F>
where
  F: Fn(&K, &K) -> cmp::Ordering,
{
  #[inline]
  fn compare(&self, a: &K, b: &K) -> cmp::Ordering {
    (self.0)(a, b)
  }
}

/// Ascend is a comparator that orders keys by their natural ascending order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ascend;

impl<K: Ord> Comparator<K> for Ascend {
  #[inline]
  fn compare(&self, a: &K, b: &K) -> cmp::Ordering {
    a.cmp(b)
  }
}

/// Descend is a comparator that orders keys by their natural descending order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Descend;

impl<K: Ord> Comparator<K> for Descend {
  #[inline]
  fn compare(&self, a: &K, b: &K) -> cmp::Ordering {
    b.cmp(a)
  }
}
