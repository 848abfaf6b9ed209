// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Node identifiers for Michael-Scott-style queues built over RMA rings:
// node_id = owner_rank * (capacity + 1) + slot_index, -1 meaning "no node".

pub const NONE: i64 = -1;

/// A decoded node identifier: which rank's ring it lives in, and which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId {
    pub owner_rank: i32,
    pub slot_index: i32,
}

impl NodeId {
    pub fn encode(owner_rank: i32, slot_index: i32, capacity: i32) -> i64 {
        owner_rank as i64 * (capacity as i64 + 1) + slot_index as i64
    }

    pub fn decode(node_id: i64, capacity: i32) -> Option<NodeId> {
        if node_id == NONE {
            return None;
        }
        let ring_size = capacity as i64 + 1;
        Some(NodeId {
            owner_rank: (node_id / ring_size) as i32,
            slot_index: (node_id % ring_size) as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let capacity = 3;
        for owner in 0..5 {
            for slot in 0..=capacity {
                let id = NodeId::encode(owner, slot, capacity);
                let decoded = NodeId::decode(id, capacity).unwrap();
                assert_eq!(decoded.owner_rank, owner);
                assert_eq!(decoded.slot_index, slot);
            }
        }
    }

    #[test]
    fn none_decodes_to_nothing() {
        assert!(NodeId::decode(NONE, 3).is_none());
    }
}
