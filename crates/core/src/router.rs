//! Key routing and rebalancing.
//!
//! The [`Router`] owns the ring and every node's store. Membership changes
//! (`add_node` / `remove_node`) mutate the ring and eagerly migrate the keys
//! whose owner changed; `store` / `retrieve` only route and delegate.
//!
//! # Rebalancing
//!
//! A virtual node owns the arc `(predecessor.token, token]`. Inserting a
//! virtual node splits its successor's arc, so only keys in the new arc move,
//! and only from that successor. Removing one merges its arc into the
//! successor's, so its keys move to that successor and nowhere else.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::node::{NodeId, NodeState};
use crate::ring::HashRing;
use crate::store::{MemoryStore, NodeStore};
use crate::token::Token;
use crate::vnode::{VirtualNode, VNODES_PER_NODE};

/// Routes keys to nodes and keeps the nodes' stores consistent with the ring.
///
/// # Invariants
///
/// - `ring.len() == VNODES_PER_NODE * node_count()`
/// - Every stored key lives in the store of the node the ring routes it to.
#[derive(Debug)]
pub struct Router<S = MemoryStore> {
    ring: HashRing,
    nodes: HashMap<NodeId, NodeState<S>>,
    config: RouterConfig,
}

impl<S: NodeStore + Default> Router<S> {
    /// Create an empty router.
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ring: HashRing::new(),
            nodes: HashMap::new(),
            config,
        })
    }

    /// Add a node, placing its virtual nodes and pulling the keys it now owns
    /// from its ring successors.
    ///
    /// # Errors
    /// - `DuplicateNode` if `node_id` is already live.
    /// - `ResourceExhausted` if `max_nodes` nodes are already live.
    /// - `AllocationFailed` if ring or node table memory cannot be reserved.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn add_node(&mut self, node_id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&node_id) {
            return Err(Error::DuplicateNode(node_id));
        }
        if self.nodes.len() >= self.config.max_nodes {
            return Err(Error::ResourceExhausted {
                limit: self.config.max_nodes,
            });
        }
        self.ring.try_reserve(VNODES_PER_NODE as usize)?;
        self.nodes
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailed { what: "node table" })?;

        self.nodes.insert(node_id, NodeState::new(node_id));

        let mut moved = 0;
        for vnode in VirtualNode::replicas_of(node_id) {
            let pos = self.ring.insert(vnode);
            moved += self.redistribute_on_add(pos);
        }

        info!(%node_id, moved, nodes = self.nodes.len(), "added node");
        Ok(())
    }

    /// Remove a node, handing each of its arcs to the ring successor that
    /// absorbs it.
    ///
    /// Removing the last live node drops its keys.
    ///
    /// # Errors
    /// `UnknownNode` if `node_id` is not live; the router is left untouched.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&node_id) {
            return Err(Error::UnknownNode(node_id));
        }

        let mut moved = 0;
        while let Some(pos) = self.ring.first_position_of(node_id) {
            moved += self.redistribute_on_remove(pos);
            self.ring.remove_at(pos);
        }

        // Keys only remain when no other node was left to take them.
        if let Some(node) = self.nodes.remove(&node_id) {
            if !node.store.is_empty() {
                warn!(%node_id, keys = node.store.len(), "last node removed, keys dropped");
            }
        }

        info!(%node_id, moved, nodes = self.nodes.len(), "removed node");
        Ok(())
    }

    /// Put `value` under `key` on the owning node.
    ///
    /// # Returns
    /// The id of the node that stored the key.
    pub fn store(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<NodeId> {
        let key = key.into();
        let owner = self.owner_of(&key)?;
        let node = self
            .nodes
            .get_mut(&owner)
            .ok_or(Error::UnknownNode(owner))?;
        node.store.put(key, value.into());
        Ok(owner)
    }

    /// Look `key` up on its owning node.
    ///
    /// # Returns
    /// The owner's id and the value, or `None` if the key is absent.
    pub fn retrieve(&self, key: &str) -> Result<(NodeId, Option<String>)> {
        let owner = self.owner_of(key)?;
        let value = self
            .nodes
            .get(&owner)
            .and_then(|node| node.store.get(key))
            .map(str::to_owned);
        Ok((owner, value))
    }

    /// Release every node store and the ring.
    pub fn teardown(mut self) {
        let nodes = self.nodes.len();
        self.nodes.clear();
        self.ring.clear();
        debug!(nodes, "router torn down");
    }

    /// Pull the keys in the arc of the virtual node at `pos` from its
    /// successor. Runs against the ring as it is right after that insert.
    fn redistribute_on_add(&mut self, pos: usize) -> usize {
        let vnode = self.ring.as_slice()[pos];
        let successor = *self.ring.successor_of(pos);

        // The arc was already ours (or the ring was empty).
        if successor.node_id == vnode.node_id {
            return 0;
        }

        let start = self.ring.predecessor_of(pos).token;
        self.migrate_arc(successor.node_id, vnode.node_id, start, vnode.token)
    }

    /// Hand the arc of the doomed virtual node at `pos` to its successor.
    fn redistribute_on_remove(&mut self, pos: usize) -> usize {
        let vnode = self.ring.as_slice()[pos];
        let successor = *self.ring.successor_of(pos);

        // Next replica of the same node absorbs the arc; it moves later.
        if successor.node_id == vnode.node_id {
            return 0;
        }

        let start = self.ring.predecessor_of(pos).token;
        self.migrate_arc(vnode.node_id, successor.node_id, start, vnode.token)
    }

    /// Move every key of `from` whose token lies in `(start, end]` to `to`.
    ///
    /// Scans all of `from`'s entries.
    fn migrate_arc(&mut self, from: NodeId, to: NodeId, start: Token, end: Token) -> usize {
        let moving: Vec<(String, String)> = match self.nodes.get(&from) {
            Some(node) => node
                .store
                .entries()
                .into_iter()
                .filter(|(key, _)| Token::for_key(key).in_arc(start, end))
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
            None => return 0,
        };
        if moving.is_empty() {
            return 0;
        }

        let Some(target) = self.nodes.get_mut(&to) else {
            return 0;
        };
        let mut keys = Vec::with_capacity(moving.len());
        for (key, value) in moving {
            target.store.put(key.clone(), value);
            keys.push(key);
        }

        if let Some(source) = self.nodes.get_mut(&from) {
            for key in &keys {
                source.store.remove(key);
            }
        }

        debug!(%from, %to, %start, %end, count = keys.len(), "migrated keys");
        keys.len()
    }
}

impl<S> Router<S> {
    /// Id of the node that owns `key`.
    pub fn owner_of(&self, key: &str) -> Result<NodeId> {
        self.ring
            .route(Token::for_key(key))
            .map(|vnode| vnode.node_id)
            .ok_or(Error::EmptyRing)
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of virtual nodes on the ring.
    pub fn vnode_count(&self) -> usize {
        self.ring.len()
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Live node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Store of a live node.
    pub fn store_of(&self, node_id: NodeId) -> Option<&S> {
        self.nodes.get(&node_id).map(|node| &node.store)
    }
}

impl<S: NodeStore> Router<S> {
    /// Total keys held across all nodes.
    pub fn key_count(&self) -> usize {
        self.nodes.values().map(|node| node.store.len()).sum()
    }
}

impl<S: NodeStore + Default> Default for Router<S> {
    fn default() -> Self {
        Self {
            ring: HashRing::new(),
            nodes: HashMap::new(),
            config: RouterConfig::default(),
        }
    }
}

/// Builder for a [`Router`] with an initial set of nodes.
///
/// # Example
/// ```rust
/// use shardkv_core::{NodeId, Router, RouterBuilder};
///
/// let router: Router = RouterBuilder::new()
///     .with_max_nodes(8)
///     .add_node(NodeId(1))
///     .add_node(NodeId(2))
///     .build()
///     .unwrap();
/// assert_eq!(router.vnode_count(), 6);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RouterBuilder {
    config: RouterConfig,
    nodes: Vec<NodeId>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.config.max_nodes = max_nodes;
        self
    }

    /// Queue a node to be added, in call order.
    pub fn add_node(mut self, node_id: NodeId) -> Self {
        self.nodes.push(node_id);
        self
    }

    pub fn build<S: NodeStore + Default>(self) -> Result<Router<S>> {
        let mut router = Router::new(self.config)?;
        for node_id in self.nodes {
            router.add_node(node_id)?;
        }
        Ok(router)
    }
}
