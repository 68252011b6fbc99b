//! Core library for a sharded key-value store routed by consistent hashing.
//!
//! This crate provides:
//! - Hash functions placing nodes and keys on a 32-bit ring
//! - Virtual node and ring abstractions
//! - The per-node store interface and an in-memory store
//! - The router that owns the ring and migrates keys on membership changes

pub mod config;
pub mod error;
pub mod hash;
pub mod node;
pub mod ring;
pub mod router;
pub mod shared;
pub mod store;
pub mod token;
pub mod vnode;

pub use config::RouterConfig;
pub use error::{Error, Result};
pub use node::{NodeId, NodeState};
pub use ring::{HashRing, Ring};
pub use router::{Router, RouterBuilder};
pub use shared::SharedRouter;
pub use store::{MemoryStore, NodeStore};
pub use token::Token;
pub use vnode::{VirtualNode, VNODES_PER_NODE};
