//! Error types for the core library.

use crate::node::NodeId;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// A missing key is not an error: `Router::retrieve` reports it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The configured node limit has been reached.
    #[error("resource exhausted: node limit of {limit} reached")]
    ResourceExhausted { limit: usize },

    /// Memory for the ring or node table could not be reserved.
    #[error("resource exhausted: failed to reserve memory for {what}")]
    AllocationFailed { what: &'static str },

    /// `add_node` was called for an id that is already live.
    #[error("node {0} is already part of the ring")]
    DuplicateNode(NodeId),

    /// `remove_node` was called for an id that is not live.
    #[error("node {0} is not part of the ring")]
    UnknownNode(NodeId),

    /// A key operation was attempted with no live nodes.
    #[error("ring is empty: no node can own the key")]
    EmptyRing,

    /// Invalid router configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for errors after which the caller should stop issuing requests.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ResourceExhausted { .. } | Error::AllocationFailed { .. }
        )
    }
}
