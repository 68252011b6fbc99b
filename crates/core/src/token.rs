//! Token abstraction for the hash ring.
//!
//! A token is a position on the 32-bit ring. Virtual nodes and keys are both
//! mapped to tokens; ownership is decided purely by comparing them.

use std::fmt;

use crate::hash::{hash_key, hash_node};
use crate::node::NodeId;

/// Distance between the replica tags of one node (`replica * TAG_STRIDE + id`).
pub const TAG_STRIDE: u32 = 100_000;

/// Position on the ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token(pub u32);

impl Token {
    /// Token of replica `replica` of node `node_id`.
    pub fn for_vnode(node_id: NodeId, replica: u8) -> Self {
        let tag = u32::from(replica)
            .wrapping_mul(TAG_STRIDE)
            .wrapping_add(node_id.0);
        Token(hash_node(tag))
    }

    /// Token a key routes by.
    pub fn for_key(key: &str) -> Self {
        Token(hash_key(key.as_bytes()))
    }

    /// Whether `self` lies in the clockwise arc `(start, end]`.
    ///
    /// The arc wraps past `u32::MAX` when `start > end`. `start == end` is the
    /// empty arc.
    #[inline]
    pub fn in_arc(self, start: Token, end: Token) -> bool {
        if start < end {
            start < self && self <= end
        } else if start > end {
            self > start || self <= end
        } else {
            false
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
