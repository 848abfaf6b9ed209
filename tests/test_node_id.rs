// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

// node_id = owner_rank * (capacity + 1) + slot_index, covering the ranges
// realistic for the RMA MPSC/MPMC BUF variants: several ranks, each with
// its own private ring of capacity+1 slots.

#[path = "../src/node.rs"]
mod node;
use node::{NodeId, NONE};

#[test]
fn distinct_owners_never_collide_for_any_slot() {
    let capacity = 5;
    let mut seen = std::collections::HashSet::new();
    for owner in 0..8 {
        for slot in 0..=capacity {
            let id = NodeId::encode(owner, slot, capacity);
            assert!(seen.insert(id), "node id {id} collided across owners/slots");
        }
    }
}

#[test]
fn encode_decode_round_trips_for_rank_zero() {
    // rank 0 must not be confused with the NONE sentinel anywhere in the
    // encoding; this is the same collision class mcs_lock.rs's `next` field
    // and the wake-token scheme both have to avoid.
    let capacity = 4;
    let id = NodeId::encode(0, 0, capacity);
    assert_ne!(id, NONE);
    let decoded = NodeId::decode(id, capacity).unwrap();
    assert_eq!(decoded, NodeId { owner_rank: 0, slot_index: 0 });
}

#[test]
fn capacity_zero_ring_has_a_single_slot_per_owner() {
    let capacity = 0;
    for owner in 0..4 {
        let id = NodeId::encode(owner, 0, capacity);
        let decoded = NodeId::decode(id, capacity).unwrap();
        assert_eq!(decoded.owner_rank, owner);
        assert_eq!(decoded.slot_index, 0);
    }
}
