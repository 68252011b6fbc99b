//! Virtual node abstractions.
//!
//! Every physical node is placed on the ring [`VNODES_PER_NODE`] times, once
//! per replica tag. Spreading a node over several positions smooths the key
//! distribution and means a join or leave only touches the arcs next to
//! those positions.
//!
//! Virtual nodes are created and destroyed in complete triples by the
//! router; the ring never holds a partial set for a live node.

use crate::node::NodeId;
use crate::token::Token;

/// Number of ring positions owned by each physical node.
pub const VNODES_PER_NODE: u8 = 3;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - `replica < VNODES_PER_NODE`
/// - `token == Token::for_vnode(node_id, replica)`
///
/// Ordering is by token first, so a slice of vnodes sorts into ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Position on the ring.
    pub token: Token,

    /// The physical node that owns this position.
    pub node_id: NodeId,

    /// Which of the node's placements this is.
    pub replica: u8,
}

impl VirtualNode {
    /// Create the virtual node for replica `replica` of `node_id`.
    pub fn new(node_id: NodeId, replica: u8) -> Self {
        debug_assert!(replica < VNODES_PER_NODE);
        Self {
            token: Token::for_vnode(node_id, replica),
            node_id,
            replica,
        }
    }

    /// All virtual nodes of `node_id`, in replica order.
    pub fn replicas_of(node_id: NodeId) -> impl Iterator<Item = VirtualNode> {
        (0..VNODES_PER_NODE).map(move |replica| Self::new(node_id, replica))
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VNode(token={}, node={}, replica={})",
            self.token, self.node_id, self.replica
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnode_creation() {
        let vnode = VirtualNode::new(NodeId(1), 0);
        assert_eq!(vnode.token(), Token(824_515_495));
        assert_eq!(vnode.node_id(), NodeId(1));
        assert_eq!(vnode.replica, 0);
    }

    #[test]
    fn test_replicas_of() {
        let vnodes: Vec<_> = VirtualNode::replicas_of(NodeId(2)).collect();
        assert_eq!(vnodes.len(), VNODES_PER_NODE as usize);
        assert!(vnodes.iter().all(|v| v.node_id() == NodeId(2)));
        assert_eq!(vnodes[0].token(), Token(1_722_258_072));
        assert_eq!(vnodes[1].token(), Token(2_840_584_532));
        assert_eq!(vnodes[2].token(), Token(1_021_602_441));
    }

    #[test]
    fn test_vnode_ordering() {
        let a = VirtualNode::new(NodeId(1), 2);
        let b = VirtualNode::new(NodeId(1), 0);
        assert!(a < b); // 790229933 < 824515495
    }
}
