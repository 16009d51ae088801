use std::vec::Vec;

use crate::MAX_HEIGHT;

/// Id of a node slot in the arena.
pub(crate) type NodeId = u32;

/// Terminates a forward chain. Also the one id the arena will never mint.
pub(crate) const NIL: NodeId = NodeId::MAX;

/// The head sentinel always lives in slot 0.
pub(crate) const HEAD: NodeId = 0;

/// One level of a node's tower: the next same-level node and the number of
/// level-0 steps to reach it. A `span` of 1 means the next node is the
/// immediate level-0 successor; the chain end (`NIL`) counts as a virtual
/// node at rank `len + 1` so spans stay well-defined at the tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
  pub(crate) next: NodeId,
  pub(crate) span: u32,
}

impl Link {
  pub(crate) const EMPTY: Self = Self { next: NIL, span: 0 };
}

/// A single entry in the list, plus its tower of forward links.
///
/// `data` is `None` only for the head sentinel. The tower length is the
/// node's height, fixed at insertion.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
  pub(crate) data: Option<(K, V)>,
  pub(crate) tower: Vec<Link>,
}

impl<K, V> Node<K, V> {
  /// The head sentinel: no data, a full-height tower with unit spans.
  pub(crate) fn sentinel() -> Self {
    let mut tower = Vec::with_capacity(MAX_HEIGHT);
    tower.resize(MAX_HEIGHT, Link { next: NIL, span: 1 });
    Self { data: None, tower }
  }

  pub(crate) fn new(key: K, value: V, height: usize) -> Self {
    let mut tower = Vec::with_capacity(height);
    tower.resize(height, Link::EMPTY);
    Self {
      data: Some((key, value)),
      tower,
    }
  }

  #[inline]
  pub(crate) fn height(&self) -> usize {
    self.tower.len()
  }

  #[inline]
  pub(crate) fn link(&self, level: usize) -> Link {
    self.tower[level]
  }

  /// The key, or `None` for the head sentinel.
  #[inline]
  pub(crate) fn key(&self) -> Option<&K> {
    self.data.as_ref().map(|(k, _)| k)
  }
}
