//! Slot arena backing the list.
//!
//! Nodes are owned by a `Vec` and addressed by stable `u32` ids, so the
//! upper levels of the list can hold plain ids instead of aliased
//! pointers. Freed slots are recycled through a free list; an id stays
//! valid for exactly as long as its node is linked.

use std::vec::Vec;

use crate::error::Error;
use crate::node::{Node, NodeId, HEAD, NIL};

#[derive(Debug)]
pub(crate) struct Arena<K, V> {
  slots: Vec<Node<K, V>>,
  free: Vec<NodeId>,
}

impl<K, V> Arena<K, V> {
  /// A fresh arena holding only the head sentinel in slot 0.
  pub(crate) fn new() -> Self {
    let mut slots = Vec::with_capacity(8);
    slots.push(Node::sentinel());
    Self {
      slots,
      free: Vec::new(),
    }
  }

  #[inline]
  pub(crate) fn get(&self, id: NodeId) -> &Node<K, V> {
    &self.slots[id as usize]
  }

  #[inline]
  pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
    &mut self.slots[id as usize]
  }

  #[inline]
  pub(crate) fn slots(&self) -> &[Node<K, V>] {
    &self.slots
  }

  /// Places a new node and returns its id, recycling a freed slot when one
  /// is available.
  pub(crate) fn alloc(&mut self, key: K, value: V, height: usize) -> Result<NodeId, Error> {
    if let Some(id) = self.free.pop() {
      self.slots[id as usize] = Node::new(key, value, height);
      return Ok(id);
    }
    if self.slots.len() >= NIL as usize {
      return Err(Error::Full);
    }
    let id = self.slots.len() as NodeId;
    self.slots.push(Node::new(key, value, height));
    Ok(id)
  }

  /// Unlinks a slot from the arena's point of view: takes the data out and
  /// marks the slot reusable. The caller must already have spliced every
  /// forward link around the node.
  pub(crate) fn dealloc(&mut self, id: NodeId) -> Option<(K, V)> {
    debug_assert_ne!(id, HEAD, "the head sentinel is never deallocated");
    let data = self.slots[id as usize].data.take();
    self.slots[id as usize].tower.clear();
    self.free.push(id);
    data
  }

  /// Drops every node except the head sentinel and restores the sentinel's
  /// tower to its initial state.
  pub(crate) fn reset(&mut self) {
    self.slots.truncate(1);
    self.slots[HEAD as usize] = Node::sentinel();
    self.free.clear();
  }
}
