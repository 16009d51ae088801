use crate::node::{Node, NodeId, NIL};

/// A lazy ascending iterator over the entries of a
/// [`SkipMap`](crate::SkipMap).
///
/// Walks the level-0 chain from the head, so the `n`-th item it yields is
/// the entry at rank `n`. Obtained from [`SkipMap::iter`](crate::SkipMap::iter);
/// each call starts a fresh traversal.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
  nodes: &'a [Node<K, V>],
  current: NodeId,
  remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
  pub(crate) fn new(nodes: &'a [Node<K, V>], first: NodeId, remaining: usize) -> Self {
    Self {
      nodes,
      current: first,
      remaining,
    }
  }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
  type Item = (&'a K, &'a V);

  fn next(&mut self) -> Option<Self::Item> {
    if self.current == NIL {
      return None;
    }
    let node = &self.nodes[self.current as usize];
    self.current = node.link(0).next;
    self.remaining -= 1;
    node.data.as_ref().map(|(k, v)| (k, v))
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> core::iter::FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
  fn clone(&self) -> Self {
    Self {
      nodes: self.nodes,
      current: self.current,
      remaining: self.remaining,
    }
  }
}
