use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;
use core::mem;

use smallvec::{smallvec, SmallVec};
use std::boxed::Box;

use crate::arena::Arena;
use crate::error::Error;
use crate::height::LevelChooser;
use crate::iter::Iter;
use crate::node::{Link, NodeId, HEAD, NIL};
use crate::{Ascend, Comparator, MAX_HEIGHT};

/// Hook invoked on every `(key, value)` pair the map releases.
type DiscardFn<K, V> = Box<dyn FnMut(K, V)>;

/// Outcome of a search ladder, sized to the active height at the time of
/// the search. `finger[i]` is the last node at level `i` strictly before
/// the target (by key or by rank) and `rank[i]` is that node's rank, with
/// the head sentinel at rank 0. `finger[0]`'s level-0 successor is the
/// search result.
struct Position {
  finger: SmallVec<[NodeId; MAX_HEIGHT]>,
  rank: SmallVec<[usize; MAX_HEIGHT]>,
}

impl Position {
  fn empty(height: usize) -> Self {
    Self {
      finger: smallvec![HEAD; height],
      rank: smallvec![0; height],
    }
  }
}

/// The finger and rank arrays left behind by the most recent search.
///
/// Purely a warm start for the next search ladder: a hint is only adopted
/// after re-checking it against the new target, so the cache can change
/// the cost of a search but never its result. Entries at and above the
/// active height are kept pointing at the head so they can never name a
/// node that has since been freed.
struct Cache {
  finger: [NodeId; MAX_HEIGHT],
  rank: [usize; MAX_HEIGHT],
}

impl Cache {
  const fn new() -> Self {
    Self {
      finger: [HEAD; MAX_HEIGHT],
      rank: [0; MAX_HEIGHT],
    }
  }

  fn reset(&mut self) {
    *self = Self::new();
  }
}

/// An ordered map over a skiplist with per-level span counters, giving
/// expected `O(log n)` search, insertion, deletion, and rank-indexed
/// access. Ranks are 1-based: the smallest entry (by the comparator) has
/// rank 1 and the largest has rank `len`.
///
/// Equal keys may coexist; [`remove`](SkipMap::remove) deletes all of
/// them at once. The map is single-threaded: it is deliberately not
/// `Sync`, and the internal search cache assumes exactly one caller.
///
/// # Example
///
/// ```rust
/// use rankmap::SkipMap;
///
/// let mut map = SkipMap::new();
/// map.insert("cherry", 3).unwrap();
/// map.insert("apple", 1).unwrap();
/// map.insert("banana", 2).unwrap();
///
/// assert_eq!(map.get(&"banana"), Some(&2));
/// assert_eq!(map.key_at(1), Some(&"apple"));
/// assert_eq!(map.key_at(3), Some(&"cherry"));
/// ```
pub struct SkipMap<K, V, C = Ascend> {
  arena: Arena<K, V>,
  /// Active level count. `1 <= height <= MAX_HEIGHT`; shrinks when the
  /// topmost levels empty out.
  height: usize,
  len: usize,
  cmp: C,
  levels: LevelChooser,
  cache: RefCell<Cache>,
  discard: Option<DiscardFn<K, V>>,
}

impl<K, V> SkipMap<K, V> {
  /// Creates an empty map ordered by [`Ascend`].
  ///
  /// ```rust
  /// let map: rankmap::SkipMap<u64, &str> = rankmap::SkipMap::new();
  /// assert!(map.is_empty());
  /// ```
  pub fn new() -> Self {
    Self::with_comparator(Ascend)
  }
}

impl<K, V> Default for SkipMap<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V, C> SkipMap<K, V, C> {
  /// Creates an empty map ordered by the given comparator.
  ///
  /// The zero-sized [`Ascend`] and [`Descend`](crate::Descend) cover the
  /// natural orders; [`CompareFn`](crate::CompareFn) wraps an arbitrary
  /// comparison function.
  ///
  /// ```rust
  /// use rankmap::{Descend, SkipMap};
  ///
  /// let mut map = SkipMap::with_comparator(Descend);
  /// for k in [1, 3, 2] {
  ///   map.insert(k, ()).unwrap();
  /// }
  /// assert_eq!(map.key_at(1), Some(&3));
  /// ```
  pub fn with_comparator(cmp: C) -> Self {
    Self {
      arena: Arena::new(),
      height: 1,
      len: 0,
      cmp,
      levels: LevelChooser::new(),
      cache: RefCell::new(Cache::new()),
      discard: None,
    }
  }

  /// Installs a hook that observes every `(key, value)` pair the map
  /// releases: on [`remove`](SkipMap::remove), on
  /// [`clear`](SkipMap::clear), and (in ascending key order) when the
  /// map is dropped. Each pair is handed to the hook exactly once.
  ///
  /// The hook must not touch the map it is installed on.
  ///
  /// ```rust
  /// use rankmap::SkipMap;
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// let log = Rc::new(RefCell::new(Vec::new()));
  /// let sink = Rc::clone(&log);
  /// let mut map = SkipMap::new().with_discard(move |k: i32, _v: &str| sink.borrow_mut().push(k));
  /// map.insert(2, "b").unwrap();
  /// map.insert(1, "a").unwrap();
  /// drop(map);
  /// assert_eq!(*log.borrow(), [1, 2]);
  /// ```
  pub fn with_discard(mut self, hook: impl FnMut(K, V) + 'static) -> Self {
    self.discard = Some(Box::new(hook));
    self
  }

  /// Returns the number of entries in the map.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns `true` if the map holds no entries.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns the active level count, in `1..=MAX_HEIGHT`.
  #[inline]
  pub fn height(&self) -> usize {
    self.height
  }

  /// Returns the comparator the map orders by.
  #[inline]
  pub fn comparator(&self) -> &C {
    &self.cmp
  }

  /// Returns a lazy ascending iterator over the entries. Every call
  /// starts a fresh traversal from rank 1.
  #[inline]
  pub fn iter(&self) -> Iter<'_, K, V> {
    Iter::new(self.arena.slots(), self.arena.get(HEAD).link(0).next, self.len)
  }

  /// Removes every entry, handing each pair to the discard hook (if any)
  /// in ascending key order, and resets the map to its freshly-created
  /// state.
  pub fn clear(&mut self) {
    let mut id = self.arena.get(HEAD).link(0).next;
    while id != NIL {
      let after = self.arena.get(id).link(0).next;
      if let Some((k, v)) = self.arena.get_mut(id).data.take() {
        if let Some(hook) = self.discard.as_mut() {
          hook(k, v);
        }
      }
      id = after;
    }
    self.arena.reset();
    self.height = 1;
    self.len = 0;
    self.levels = LevelChooser::new();
    self.cache.get_mut().reset();
    #[cfg(feature = "tracing")]
    tracing::trace!("cleared map");
  }

  /// Entry at the given 1-based rank, or `None` when `rank` is outside
  /// `[1, len]`.
  fn node_at(&self, rank: usize) -> Option<NodeId> {
    if rank == 0 || rank > self.len {
      return None;
    }
    let pos = self.find_rank(rank);
    let target = self.arena.get(pos.finger[0]).link(0).next;
    debug_assert_ne!(target, NIL);
    (target != NIL).then_some(target)
  }

  /// Returns the key at the given 1-based rank, or `None` when `rank` is
  /// outside `[1, len]`.
  ///
  /// ```rust
  /// use rankmap::SkipMap;
  ///
  /// let mut map = SkipMap::new();
  /// for k in [5, 3, 8, 1] {
  ///   map.insert(k, ()).unwrap();
  /// }
  /// assert_eq!(map.key_at(1), Some(&1));
  /// assert_eq!(map.key_at(4), Some(&8));
  /// assert_eq!(map.key_at(5), None);
  /// assert_eq!(map.key_at(0), None);
  /// ```
  pub fn key_at(&self, rank: usize) -> Option<&K> {
    self.entry_at(rank).map(|(k, _)| k)
  }

  /// Returns the value at the given 1-based rank, or `None` when `rank`
  /// is outside `[1, len]`.
  pub fn value_at(&self, rank: usize) -> Option<&V> {
    self.entry_at(rank).map(|(_, v)| v)
  }

  /// Returns the entry at the given 1-based rank, or `None` when `rank`
  /// is outside `[1, len]`.
  pub fn entry_at(&self, rank: usize) -> Option<(&K, &V)> {
    let id = self.node_at(rank)?;
    self.arena.get(id).data.as_ref().map(|(k, v)| (k, v))
  }

  /// Replaces the value at the given 1-based rank, leaving the key and
  /// the structure untouched, and returns the previous value. When `rank`
  /// is outside `[1, len]` this is a no-op: `None` comes back and the
  /// passed value is dropped.
  pub fn update_at(&mut self, rank: usize, value: V) -> Option<V> {
    let id = self.node_at(rank)?;
    self
      .arena
      .get_mut(id)
      .data
      .as_mut()
      .map(|(_, v)| mem::replace(v, value))
  }

  /// Rank search: `finger[i]` becomes the last node at level `i` whose
  /// rank is strictly less than `n`. Callers must have checked that `n`
  /// is in `[1, len]`.
  fn find_rank(&self, n: usize) -> Position {
    debug_assert!(n >= 1 && n <= self.len);
    let mut pos = Position::empty(self.height);
    let mut cache = self.cache.borrow_mut();
    let mut f = HEAD;
    let mut place = 0usize;
    for level in (0..self.height).rev() {
      // Warm start from the previous search if it ended short of rank n.
      if cache.rank[level] < n {
        f = cache.finger[level];
        place = cache.rank[level];
      }
      loop {
        let link = self.arena.get(f).link(level);
        if link.next == NIL || place + link.span as usize >= n {
          break;
        }
        place += link.span as usize;
        f = link.next;
      }
      cache.finger[level] = f;
      cache.rank[level] = place;
      pos.finger[level] = f;
      pos.rank[level] = place;
    }
    pos
  }
}

impl<K, V, C> SkipMap<K, V, C>
where
  C: Comparator<K>,
{
  /// Key search: `finger[i]` becomes the last node at level `i` whose key
  /// is strictly less than `key`, so `finger[0]`'s level-0 successor is
  /// the first node whose key is equal or greater.
  fn find(&self, key: &K) -> Position {
    let mut pos = Position::empty(self.height);
    let mut cache = self.cache.borrow_mut();
    let mut f = HEAD;
    let mut last = 0usize;
    for level in (0..self.height).rev() {
      let mut rank = last;
      // Warm start from the previous search if its finger is still
      // strictly before the target.
      if let Some(hk) = self.arena.get(cache.finger[level]).key() {
        if self.cmp.compare(key, hk) == Ordering::Greater {
          f = cache.finger[level];
          rank = cache.rank[level];
        }
      }
      loop {
        let link = self.arena.get(f).link(level);
        if link.next == NIL {
          break;
        }
        match self.arena.get(link.next).key() {
          Some(nk) if self.cmp.compare(key, nk) == Ordering::Greater => {
            rank += link.span as usize;
            f = link.next;
          }
          _ => break,
        }
      }
      cache.finger[level] = f;
      cache.rank[level] = rank;
      pos.finger[level] = f;
      pos.rank[level] = rank;
      last = rank;
    }
    pos
  }

  /// Returns a reference to the value of the first entry whose key
  /// compares equal, or `None` when no key matches.
  ///
  /// ```rust
  /// use rankmap::SkipMap;
  ///
  /// let mut map = SkipMap::new();
  /// map.insert(7, "seven").unwrap();
  /// assert_eq!(map.get(&7), Some(&"seven"));
  /// assert_eq!(map.get(&8), None);
  /// ```
  pub fn get(&self, key: &K) -> Option<&V> {
    let pos = self.find(key);
    let target = self.arena.get(pos.finger[0]).link(0).next;
    if target == NIL {
      return None;
    }
    let (k, v) = self.arena.get(target).data.as_ref()?;
    match self.cmp.compare(key, k) {
      Ordering::Equal => Some(v),
      _ => None,
    }
  }

  /// Returns a mutable reference to the value of the first entry whose
  /// key compares equal.
  pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
    let pos = self.find(key);
    let target = self.arena.get(pos.finger[0]).link(0).next;
    if target == NIL {
      return None;
    }
    let matched = match self.arena.get(target).key() {
      Some(k) => self.cmp.compare(key, k) == Ordering::Equal,
      None => false,
    };
    if !matched {
      return None;
    }
    self.arena.get_mut(target).data.as_mut().map(|(_, v)| v)
  }

  /// Returns `true` if some entry's key compares equal.
  #[inline]
  pub fn contains_key(&self, key: &K) -> bool {
    self.get(key).is_some()
  }

  /// Inserts the pair into the map.
  ///
  /// Duplicate keys are not rejected: a new entry with an equal key is
  /// spliced in front of the existing ones, so among equal keys the most
  /// recently inserted comes first.
  ///
  /// Errors only when the arena has no node id left to mint.
  pub fn insert(&mut self, key: K, value: V) -> Result<(), Error> {
    let Position {
      mut finger,
      mut rank,
    } = self.find(&key);
    let height = self.levels.next();
    let id = self.arena.alloc(key, value, height)?;

    if height > self.height {
      // Freshly activated levels descend straight from the head and span
      // the whole list until the new node splits them.
      for level in self.height..height {
        finger.push(HEAD);
        rank.push(0);
        self.arena.get_mut(HEAD).tower[level].span = self.len as u32 + 1;
      }
      self.height = height;
    }

    let d0 = rank[0];
    for level in 0..height {
      let pred = finger[level];
      let old = self.arena.get(pred).link(level);
      self.arena.get_mut(id).tower[level] = Link {
        next: old.next,
        span: (old.span as usize + rank[level] - d0) as u32,
      };
      self.arena.get_mut(pred).tower[level] = Link {
        next: id,
        span: (d0 - rank[level] + 1) as u32,
      };
    }
    // Every active level above the new tower gained one element
    // underneath it.
    for level in height..self.height {
      self.arena.get_mut(finger[level]).tower[level].span += 1;
    }
    self.len += 1;

    #[cfg(feature = "tracing")]
    tracing::trace!(height, len = self.len, "inserted entry");
    Ok(())
  }

  /// Removes every entry whose key compares equal and returns how many
  /// were removed. Removing an absent key is a no-op returning 0.
  ///
  /// Each removed pair is handed to the discard hook, if one is
  /// installed.
  ///
  /// ```rust
  /// use rankmap::SkipMap;
  ///
  /// let mut map = SkipMap::new();
  /// map.insert(1, "a").unwrap();
  /// map.insert(1, "b").unwrap();
  /// assert_eq!(map.remove(&1), 2);
  /// assert_eq!(map.remove(&1), 0);
  /// ```
  pub fn remove(&mut self, key: &K) -> usize {
    let pos = self.find(key);
    let mut removed = 0usize;
    loop {
      let target = self.arena.get(pos.finger[0]).link(0).next;
      if target == NIL {
        break;
      }
      match self.arena.get(target).key() {
        Some(k) if self.cmp.compare(k, key) == Ordering::Equal => {}
        _ => break,
      }
      for level in 0..self.height {
        let pred = pos.finger[level];
        let link = self.arena.get(pred).link(level);
        if link.next == target {
          let bypass = self.arena.get(target).link(level);
          self.arena.get_mut(pred).tower[level] = Link {
            next: bypass.next,
            span: link.span + bypass.span - 1,
          };
        } else {
          // The target sat strictly inside this span.
          self.arena.get_mut(pred).tower[level].span -= 1;
        }
      }
      if let Some((k, v)) = self.arena.dealloc(target) {
        self.len -= 1;
        removed += 1;
        if let Some(hook) = self.discard.as_mut() {
          hook(k, v);
        }
      }
    }
    if removed > 0 {
      self.shrink();
      #[cfg(feature = "tracing")]
      tracing::trace!(removed, len = self.len, "removed matching entries");
    }
    removed
  }

  /// Deactivates trailing empty levels, resetting their cache entries so
  /// a regrown level starts from the head.
  fn shrink(&mut self) {
    while self.height > 1 && self.arena.get(HEAD).link(self.height - 1).next == NIL {
      self.height -= 1;
      let cache = self.cache.get_mut();
      cache.finger[self.height] = HEAD;
      cache.rank[self.height] = 0;
    }
  }
}

impl<K, V, C> Drop for SkipMap<K, V, C> {
  fn drop(&mut self) {
    // Without a hook the arena drop releases everything; with one, every
    // remaining pair must be observed in ascending order.
    if self.discard.is_some() {
      self.clear();
    }
  }
}

impl<'a, K, V, C> IntoIterator for &'a SkipMap<K, V, C> {
  type Item = (&'a K, &'a V);
  type IntoIter = Iter<'a, K, V>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<K, V, C> fmt::Debug for SkipMap<K, V, C>
where
  K: fmt::Debug,
  V: fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

#[cfg(test)]
impl<K, V, C> SkipMap<K, V, C>
where
  C: Comparator<K>,
{
  /// Structural audit: level-0 reachability matches `len`, keys ascend,
  /// every span equals the rank distance it claims (with the chain end as
  /// a virtual node at rank `len + 1`), and no level above the active
  /// height is occupied.
  fn check_invariants(&self) {
    use std::collections::BTreeMap;
    use std::vec::Vec;

    let mut rank_of = BTreeMap::new();
    rank_of.insert(HEAD, 0usize);
    let mut id = self.arena.get(HEAD).link(0).next;
    let mut count = 0usize;
    while id != NIL {
      count += 1;
      rank_of.insert(id, count);
      assert!(
        self.arena.get(id).height() <= self.height,
        "a tower pokes above the active height"
      );
      id = self.arena.get(id).link(0).next;
    }
    assert_eq!(count, self.len, "level-0 chain length drifted from len");

    let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
    for pair in keys.windows(2) {
      assert_ne!(
        self.cmp.compare(pair[0], pair[1]),
        Ordering::Greater,
        "iteration order violates the comparator"
      );
    }

    for level in 0..self.height {
      let mut id = HEAD;
      loop {
        let link = self.arena.get(id).link(level);
        let here = rank_of[&id];
        let there = match link.next {
          NIL => self.len + 1,
          next => rank_of[&next],
        };
        assert_eq!(
          link.span as usize,
          there - here,
          "span mismatch at level {level}"
        );
        if link.next == NIL {
          break;
        }
        id = link.next;
      }
    }

    if self.height > 1 {
      assert_ne!(
        self.arena.get(HEAD).link(self.height - 1).next,
        NIL,
        "active height overshoots the occupied levels"
      );
    }
    for level in self.height..MAX_HEIGHT {
      assert_eq!(self.arena.get(HEAD).link(level).next, NIL);
    }
  }
}
