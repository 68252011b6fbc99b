//! Per-node key-value storage.
//!
//! The router only talks to storage through [`NodeStore`]. [`MemoryStore`] is
//! the in-process implementation every node gets by default.

use std::collections::HashMap;

/// Key-value map owned by one node.
pub trait NodeStore {
    /// Insert or overwrite `key`.
    fn put(&mut self, key: String, value: String);

    /// Look up `key`. Returns `None` if not present.
    fn get(&self, key: &str) -> Option<&str>;

    /// Delete `key`, returning its value if it was present.
    fn remove(&mut self, key: &str) -> Option<String>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored `(key, value)` pair, in no particular order.
    ///
    /// Only used to scan a node's keys during migration.
    fn entries(&self) -> Vec<(&str, &str)>;
}

/// In-memory store backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryStore {
    fn put(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}
