//! Consistent hash ring implementation.
//!
//! The ring manages virtual node positions and answers which node is
//! responsible for a key.

#[allow(clippy::module_inception)]
pub mod ring;

pub use ring::HashRing;

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
