//! Hash functions that place virtual nodes and keys on the ring.
//!
//! Both functions are pure and unsalted: the same input always lands on the
//! same ring position, across calls and across processes.

/// Multiplier of the node avalanche.
const AVALANCHE_MUL: u32 = 0x45d9_f3b;

/// Seed of the djb2 key hash.
const DJB2_SEED: u32 = 5381;

/// Integer avalanche hash used for virtual node placement.
///
/// Input is the replica tag `replica * 100_000 + node_id`.
#[inline]
pub fn hash_node(tag: u32) -> u32 {
    let mut x = tag;
    x = ((x >> 16) ^ x).wrapping_mul(AVALANCHE_MUL);
    x = ((x >> 16) ^ x).wrapping_mul(AVALANCHE_MUL);
    (x >> 16) ^ x
}

/// djb2 over the key bytes (`h = h * 33 + byte`), truncated to 32 bits.
#[inline]
pub fn hash_key(key: &[u8]) -> u32 {
    key.iter().fold(DJB2_SEED, |h, &b| {
        (h << 5).wrapping_add(h).wrapping_add(u32::from(b))
    })
}
