//! Hash ring data structure.
//!
//! Holds the virtual nodes in a `Vec` sorted by token and answers
//! nearest-successor queries with a binary search. The ring is circular: the
//! successor of the last entry is the first one.

use tracing::trace;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// Ordered, circular sequence of virtual nodes.
///
/// # Invariants
///
/// - Entries are sorted ascending by token.
/// - Entries with equal tokens keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    vnodes: Vec<VirtualNode>,
}

impl HashRing {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a virtual node, keeping the ring sorted.
    ///
    /// The new entry goes after every entry whose token is less than or
    /// equal to its own, so it is appended when its token is the largest.
    ///
    /// # Returns
    /// The index the entry was inserted at.
    ///
    /// # Performance
    /// O(log n) search plus O(n) shift.
    pub fn insert(&mut self, vnode: VirtualNode) -> usize {
        let pos = self.vnodes.partition_point(|v| v.token <= vnode.token);
        self.vnodes.insert(pos, vnode);
        trace!(%vnode, pos, "inserted vnode");
        pos
    }

    /// Remove and return the entry at `index`, shifting later entries left.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    pub fn remove_at(&mut self, index: usize) -> VirtualNode {
        let vnode = self.vnodes.remove(index);
        trace!(%vnode, index, "removed vnode");
        vnode
    }

    /// Entry following `index`, wrapping from the last slot to the first.
    ///
    /// # Panics
    /// If the ring is empty.
    #[inline]
    pub fn successor_of(&self, index: usize) -> &VirtualNode {
        &self.vnodes[(index + 1) % self.vnodes.len()]
    }

    /// Entry preceding `index`, wrapping from the first slot to the last.
    ///
    /// # Panics
    /// If the ring is empty.
    #[inline]
    pub fn predecessor_of(&self, index: usize) -> &VirtualNode {
        let len = self.vnodes.len();
        &self.vnodes[(index + len - 1) % len]
    }

    /// Index of the entry owning `token`: the first entry whose token is
    /// `>= token`, or 0 when `token` is past the last entry.
    pub fn route_index(&self, token: Token) -> Option<usize> {
        if self.vnodes.is_empty() {
            return None;
        }
        let idx = self.vnodes.partition_point(|v| v.token < token);
        Some(if idx == self.vnodes.len() { 0 } else { idx })
    }

    /// Virtual node owning `token`. `None` on an empty ring.
    pub fn route(&self, token: Token) -> Option<&VirtualNode> {
        self.route_index(token).map(|idx| &self.vnodes[idx])
    }

    /// Entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&VirtualNode> {
        self.vnodes.get(index)
    }

    /// Last (largest-token) entry.
    pub fn last(&self) -> Option<&VirtualNode> {
        self.vnodes.last()
    }

    /// Index of the first entry owned by `node_id`, in ring order.
    pub fn first_position_of(&self, node_id: NodeId) -> Option<usize> {
        self.vnodes.iter().position(|v| v.node_id == node_id)
    }

    /// Indices of every entry owned by `node_id`, in ring order.
    pub fn positions_of(&self, node_id: NodeId) -> Vec<usize> {
        self.vnodes
            .iter()
            .enumerate()
            .filter(|(_, v)| v.node_id == node_id)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.vnodes.iter().any(|v| v.node_id == node_id)
    }

    /// Number of entries owned by `node_id`.
    pub fn replica_count(&self, node_id: NodeId) -> usize {
        self.vnodes.iter().filter(|v| v.node_id == node_id).count()
    }

    /// Reserve room for `additional` entries before any of them is inserted.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.vnodes
            .try_reserve(additional)
            .map_err(|_| Error::AllocationFailed { what: "ring slots" })
    }

    /// True if tokens are non-decreasing from first to last entry.
    pub fn is_sorted(&self) -> bool {
        self.vnodes.windows(2).all(|w| w[0].token <= w[1].token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualNode> {
        self.vnodes.iter()
    }

    pub fn as_slice(&self) -> &[VirtualNode] {
        &self.vnodes
    }

    pub fn len(&self) -> usize {
        self.vnodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vnodes.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.vnodes.clear();
    }
}
