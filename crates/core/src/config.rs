//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vnode::VNODES_PER_NODE;

/// Ring slots available by default.
pub const DEFAULT_RING_SLOTS: usize = 99_999;

/// Default node limit: one node per [`VNODES_PER_NODE`] ring slots.
pub const DEFAULT_MAX_NODES: usize = DEFAULT_RING_SLOTS / VNODES_PER_NODE as usize;

/// Tunables for a [`Router`](crate::Router).
///
/// Deserializes from e.g. `{"max_nodes": 64}`; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Most nodes that may be live at once. Adding one more fails with
    /// `ResourceExhausted`.
    pub max_nodes: usize,
}

impl RouterConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(Error::InvalidConfig(
                "max_nodes must be at least 1".to_string(),
            ));
        }
        if self.max_nodes.checked_mul(VNODES_PER_NODE as usize).is_none() {
            return Err(Error::InvalidConfig(format!(
                "max_nodes {} overflows the ring size",
                self.max_nodes
            )));
        }
        Ok(())
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}
