//! Scenario tests for routing and rebalancing.
//!
//! Token placements used below (node tokens are `hash_node(replica * 100000 + id)`):
//!
//! ```text
//! node 1: 824515495 (r0), 3432152191 (r1), 790229933 (r2)
//! node 2: 1722258072 (r0), 2840584532 (r1), 1021602441 (r2)
//! node 3: 3753300549 (r0), 416523455 (r1), 2569402623 (r2)
//!
//! "a"         177670
//! "b"         177671
//! "user-0"    556066177
//! "user-10"   1170314738
//! "user-1000" 3162431698
//! "user-100"  4260648034
//! ```

use shardkv_core::{Error, NodeId, NodeStore, Router, Token, VNODES_PER_NODE};

const KEYS: [&str; 5] = ["a", "user-0", "user-10", "user-1000", "user-100"];

fn owner_of_each(router: &Router) -> Vec<NodeId> {
    KEYS.iter().map(|k| router.owner_of(k).unwrap()).collect()
}

fn assert_values_intact(router: &Router) {
    for key in KEYS {
        let (owner, value) = router.retrieve(key).unwrap();
        assert_eq!(value.as_deref(), Some(key), "value of {key} lost");
        assert_eq!(
            router.store_of(owner).unwrap().get(key),
            Some(key),
            "{key} not held by its owner {owner}"
        );
    }
    assert_eq!(router.key_count(), KEYS.len(), "key duplicated or lost");
}

// ============================================================================
// Worked example
// ============================================================================

#[test]
fn test_two_node_example() {
    let mut router: Router = Router::default();

    router.add_node(NodeId(1)).unwrap();
    assert_eq!(router.vnode_count(), 3);
    assert!(router.ring().iter().all(|v| v.node_id == NodeId(1)));

    assert_eq!(router.store("a", "1"), Ok(NodeId(1)));
    assert_eq!(router.store("b", "2"), Ok(NodeId(1)));

    router.add_node(NodeId(2)).unwrap();
    assert_eq!(router.vnode_count(), 6);
    for (key, value) in [("a", "1"), ("b", "2")] {
        let (_, got) = router.retrieve(key).unwrap();
        assert_eq!(got.as_deref(), Some(value));
    }

    router.remove_node(NodeId(1)).unwrap();
    assert_eq!(router.vnode_count(), 3);
    assert!(router.ring().iter().all(|v| v.node_id == NodeId(2)));
    assert_eq!(router.retrieve("a"), Ok((NodeId(2), Some("1".to_string()))));
    assert_eq!(router.retrieve("b"), Ok((NodeId(2), Some("2".to_string()))));
}

// ============================================================================
// Add / remove with known placements
// ============================================================================

#[test]
fn test_three_node_lifecycle() {
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    for key in KEYS {
        assert_eq!(router.store(key, key), Ok(NodeId(1)));
    }

    // Node 2 claims (824515495, 1722258072]: only user-10.
    router.add_node(NodeId(2)).unwrap();
    assert_eq!(
        owner_of_each(&router),
        vec![NodeId(1), NodeId(1), NodeId(2), NodeId(1), NodeId(1)]
    );
    assert_values_intact(&router);

    // Node 3 becomes the ring head (416523455): it takes "a" and, through the
    // wraparound arc past 3753300549, user-100.
    router.add_node(NodeId(3)).unwrap();
    assert_eq!(router.ring().get(0).unwrap().node_id, NodeId(3));
    assert_eq!(router.ring().last().unwrap().node_id, NodeId(3));
    assert_eq!(
        owner_of_each(&router),
        vec![NodeId(3), NodeId(1), NodeId(2), NodeId(1), NodeId(3)]
    );
    assert_values_intact(&router);
    assert_eq!(router.store_of(NodeId(1)).unwrap().len(), 2);

    // Node 1's arcs split between its two different successors.
    router.remove_node(NodeId(1)).unwrap();
    assert_eq!(
        owner_of_each(&router),
        vec![NodeId(3), NodeId(2), NodeId(2), NodeId(3), NodeId(3)]
    );
    assert_values_intact(&router);
    assert!(router.store_of(NodeId(1)).is_none());

    router.remove_node(NodeId(2)).unwrap();
    assert_eq!(owner_of_each(&router), vec![NodeId(3); KEYS.len()]);
    assert_values_intact(&router);
    assert_eq!(router.store_of(NodeId(3)).unwrap().len(), KEYS.len());
}

#[test]
fn test_add_only_steals_from_successors() {
    let mut router: Router = Router::default();
    for id in 1..=4 {
        router.add_node(NodeId(id)).unwrap();
    }
    let keys: Vec<String> = (0..500).map(|i| format!("{i:x}-{}", i * 7919)).collect();
    for key in &keys {
        router.store(key.as_str(), key.as_str()).unwrap();
    }
    let before: Vec<NodeId> = keys.iter().map(|k| router.owner_of(k).unwrap()).collect();

    router.add_node(NodeId(5)).unwrap();

    for (key, old_owner) in keys.iter().zip(before) {
        let (owner, value) = router.retrieve(key).unwrap();
        assert!(owner == old_owner || owner == NodeId(5), "{key} moved between old nodes");
        assert_eq!(value.as_deref(), Some(key.as_str()));
    }
    assert_eq!(router.key_count(), keys.len());
}

#[test]
fn test_remove_only_feeds_successors() {
    let mut router: Router = Router::default();
    for id in 1..=4 {
        router.add_node(NodeId(id)).unwrap();
    }
    let keys: Vec<String> = (0..500).map(|i| format!("k{}", i * 104_729)).collect();
    for key in &keys {
        router.store(key.as_str(), "v").unwrap();
    }
    let before: Vec<NodeId> = keys.iter().map(|k| router.owner_of(k).unwrap()).collect();

    router.remove_node(NodeId(2)).unwrap();

    for (key, old_owner) in keys.iter().zip(before) {
        let (owner, value) = router.retrieve(key).unwrap();
        if old_owner != NodeId(2) {
            assert_eq!(owner, old_owner, "{key} moved although its owner stayed");
        }
        assert_eq!(value.as_deref(), Some("v"));
    }
    assert_eq!(router.key_count(), keys.len());
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_wraparound_routes_to_first_entry() {
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    router.add_node(NodeId(2)).unwrap();

    // 4260648034 is past every token, so the smallest-token entry owns it.
    let last = router.ring().last().unwrap().token;
    assert!(Token::for_key("user-100") > last);
    let first = *router.ring().get(0).unwrap();
    assert_eq!(router.owner_of("user-100"), Ok(first.node_id));
}

#[test]
fn test_add_remove_add() {
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    router.add_node(NodeId(2)).unwrap();
    router.store("a", "1").unwrap();

    router.remove_node(NodeId(2)).unwrap();
    router.add_node(NodeId(2)).unwrap();

    assert_eq!(router.node_count(), 2);
    assert_eq!(router.ring().replica_count(NodeId(2)), VNODES_PER_NODE as usize);
    assert_eq!(router.retrieve("a").unwrap().1.as_deref(), Some("1"));
}

#[test]
fn test_errors_leave_ring_untouched() {
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    let snapshot = router.ring().as_slice().to_vec();

    assert_eq!(router.add_node(NodeId(1)), Err(Error::DuplicateNode(NodeId(1))));
    assert_eq!(router.remove_node(NodeId(2)), Err(Error::UnknownNode(NodeId(2))));

    assert_eq!(router.ring().as_slice(), snapshot.as_slice());
    assert_eq!(router.node_count(), 1);
}

#[test]
fn test_colliding_tags_share_a_token() {
    // 100001 is both replica 0 of node 100001 and replica 1 of node 1.
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    router.store("user-1000", "v").unwrap();

    router.add_node(NodeId(100_001)).unwrap();
    assert!(router.ring().is_sorted());
    // The earlier entry keeps the tied position, so the key stays put.
    assert_eq!(router.owner_of("user-1000"), Ok(NodeId(1)));

    router.remove_node(NodeId(1)).unwrap();
    assert_eq!(router.retrieve("user-1000"), Ok((NodeId(100_001), Some("v".to_string()))));
}

#[test]
fn test_idempotent_lookup() {
    let mut router: Router = Router::default();
    router.add_node(NodeId(1)).unwrap();
    router.add_node(NodeId(2)).unwrap();
    router.store("consistent-key", "v").unwrap();

    let first = router.retrieve("consistent-key").unwrap();
    for _ in 0..3 {
        assert_eq!(router.retrieve("consistent-key").unwrap(), first);
    }
}
