// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

// Exercises the ring index invariants end-to-end scenario S3 describes:
// capacity 2, five sends each immediately drained by a receive, indices
// must wrap through the 3-slot physical ring without ever reporting more
// than 2 used slots.

#[path = "../src/ring.rs"]
mod ring;
use ring::RingIndices;

#[test]
fn scenario_s3_ring_wrap_five_sends_capacity_two() {
    let values = [10, 20, 30, 40, 50];
    let mut ring = RingIndices::new(2);
    let mut slots_seen = Vec::new();

    for &_v in &values {
        assert!(!ring.is_full(), "ring must accept a send when not full");
        slots_seen.push(ring.write);
        ring.advance_write();
        assert!(ring.used() <= 2, "used slots must never exceed capacity");
        ring.advance_read();
    }

    assert_eq!(slots_seen, vec![0, 1, 2, 0, 1]);
    assert!(ring.is_empty());
}

#[test]
fn interleaved_sends_and_receives_never_exceed_capacity() {
    let mut ring = RingIndices::new(3);
    // send, send, receive, send, send, send, receive, receive, receive
    let ops = "SSRSSSRRR";
    for op in ops.chars() {
        match op {
            'S' => {
                assert!(!ring.is_full());
                ring.advance_write();
            }
            'R' => {
                assert!(!ring.is_empty());
                ring.advance_read();
            }
            _ => unreachable!(),
        }
        assert!(ring.used() <= 3);
    }
    assert!(ring.is_empty());
}
