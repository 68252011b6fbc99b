//! Thread-safe router handle.
//!
//! Wraps a [`Router`] in one exclusive lock. Ring mutation and key migration
//! hold the lock for their whole duration, so a concurrent lookup never sees
//! a half-migrated ring.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RouterConfig;
use crate::error::Result;
use crate::node::NodeId;
use crate::router::Router;
use crate::store::{MemoryStore, NodeStore};

/// Cloneable handle to a router shared between threads.
#[derive(Debug)]
pub struct SharedRouter<S = MemoryStore> {
    inner: Arc<Mutex<Router<S>>>,
}

impl<S> Clone for SharedRouter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: NodeStore + Default> SharedRouter<S> {
    pub fn new(config: RouterConfig) -> Result<Self> {
        Ok(Self::from_router(Router::new(config)?))
    }

    pub fn from_router(router: Router<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(router)),
        }
    }

    pub fn add_node(&self, node_id: NodeId) -> Result<()> {
        self.inner.lock().add_node(node_id)
    }

    pub fn remove_node(&self, node_id: NodeId) -> Result<()> {
        self.inner.lock().remove_node(node_id)
    }

    pub fn store(&self, key: impl Into<String>, value: impl Into<String>) -> Result<NodeId> {
        self.inner.lock().store(key, value)
    }

    pub fn retrieve(&self, key: &str) -> Result<(NodeId, Option<String>)> {
        self.inner.lock().retrieve(key)
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().node_count()
    }

    /// Run `f` with the router locked, for reads that must see one
    /// consistent snapshot.
    pub fn with<R>(&self, f: impl FnOnce(&Router<S>) -> R) -> R {
        let guard = self.inner.lock();
        f(&*guard)
    }
}
