// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

// Scenario S2 (credit bound) depends on the attached-buffer reservation
// being large enough for `capacity` outstanding sends and no more; these
// tests check the manager's own accounting invariant (testable property 6:
// free() restores append()'s effect) in isolation from any channel.

#[path = "../src/buffer_manager.rs"]
mod buffer_manager;
use buffer_manager::{BufferManager, BufferOutcome};

#[test]
fn append_then_matching_shrink_restores_zero() {
    let mgr = BufferManager::new();
    assert_eq!(mgr.append(4096), BufferOutcome::Ok);
    assert_eq!(mgr.current_size(), 4096);
    assert_eq!(mgr.shrink(4096), BufferOutcome::Ok);
    assert_eq!(mgr.current_size(), 0);
}

#[test]
fn repeated_append_accumulates_across_several_channels() {
    let mgr = BufferManager::new();
    // p2p_spsc_buf reservation for a sender: (data_size + overhead) * capacity
    let data_size = 64i64;
    let overhead = 128i64;
    let capacity = 4i64;
    mgr.append((data_size + overhead) * capacity);
    // a second channel in the same process adds its own reservation
    mgr.append((data_size + overhead) * capacity);
    assert_eq!(mgr.current_size(), 2 * (data_size + overhead) * capacity);

    mgr.shrink((data_size + overhead) * capacity);
    assert_eq!(mgr.current_size(), (data_size + overhead) * capacity);
    mgr.shrink((data_size + overhead) * capacity);
    assert_eq!(mgr.current_size(), 0);
}

#[test]
fn shrinking_past_what_was_reserved_is_unrecoverable() {
    let mgr = BufferManager::new();
    mgr.append(512);
    assert_eq!(mgr.shrink(1024), BufferOutcome::FailedUnrecoverable);
    // accounting is restored even on the unrecoverable path
    assert_eq!(mgr.current_size(), 512);
}
