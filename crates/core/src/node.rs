//! Node abstractions for the consistent hash ring.
//!
//! Nodes are identified by a compact `NodeId`. The router keeps one
//! [`NodeState`] per live node; the ring itself only stores ids.

use std::fmt;

/// Identifier of a physical storage node.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

/// A live node together with the store holding its keys.
///
/// Owned exclusively by the router: created before its virtual nodes are
/// placed on the ring and dropped after they are gone.
#[derive(Debug)]
pub struct NodeState<S> {
    pub id: NodeId,
    pub store: S,
}

impl<S: Default> NodeState<S> {
    /// Construct a node with an empty store.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            store: S::default(),
        }
    }
}
