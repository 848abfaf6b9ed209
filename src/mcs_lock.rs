// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Distributed MCS spin lock over an RMA window. The anchor is whichever
// rank owns the `latest` word (the lowest-ranked receiver in every variant
// that uses this). Each participant addresses three words on the anchor's
// window: `latest` (shared, CAS'd), and its own `next`/`spin` pair (written
// by whoever currently holds the lock ahead of it).

use crate::error::ChannelResult;
use crate::node::NONE;
use crate::spin::poll_until;
use crate::substrate_ops::Window;

/// Per-participant offsets, relative to a lock's own `base_disp`: `latest`
/// first, then `next`/`spin` pairs, 16 bytes apart. A window hosting more
/// than one independent lock (RMA MPMC SYNC's sender/receiver locks, RMA
/// MPMC BUF's consumer lock alongside its head/tail/wake-token words) gives
/// each lock a distinct, non-overlapping `base_disp`.
pub fn latest_disp(base_disp: i64) -> i64 {
    base_disp
}
pub fn next_disp(base_disp: i64, rank_index: i32) -> i64 {
    base_disp + 8 + rank_index as i64 * 16
}
pub fn spin_disp(base_disp: i64, rank_index: i32) -> i64 {
    next_disp(base_disp, rank_index) + 8
}

/// One participant's handle to a distributed MCS lock anchored elsewhere
/// (possibly this same rank, if this rank is the anchor).
pub struct McsLock<'a> {
    pub anchor_window: &'a Window,
    /// Rank that owns the `latest`/`next`/`spin` region in `anchor_window`.
    /// Every RMA access this lock makes targets this rank, never the
    /// caller's own rank.
    pub anchor_rank: i32,
    /// Byte offset of this lock's own region within the anchor's window.
    pub base_disp: i64,
    /// This participant's index into the anchor's per-participant region,
    /// used to compute `next_disp`/`spin_disp` — not necessarily equal to
    /// the MPI rank, since the anchor only reserves slots for group members.
    pub my_index: i32,
}

impl<'a> McsLock<'a> {
    /// Acquire the lock. Blocks until held; no timeout, per the crate's
    /// no-spurious-timeouts rule.
    pub fn acquire(&self) -> ChannelResult<()> {
        let my_node = self.my_index as i64;
        let predecessor = self.anchor_window.fetch_and_replace_i64(
            my_node,
            self.anchor_rank,
            latest_disp(self.base_disp),
        )?;
        if predecessor == NONE {
            return Ok(());
        }
        // Mark ourselves as waiting before publishing our node to our
        // predecessor, so it never observes a stale spin flag.
        self.anchor_window.accumulate_replace_i32(
            1,
            self.anchor_rank,
            spin_disp(self.base_disp, self.my_index),
        )?;
        self.anchor_window.accumulate_replace_i32(
            self.my_index,
            self.anchor_rank,
            next_disp(self.base_disp, predecessor as i32),
        )?;
        poll_until(
            || {
                let mut buf = [0u8; 4];
                self.anchor_window
                    .get(&mut buf, self.anchor_rank, spin_disp(self.base_disp, self.my_index))
                    .ok();
                i32::from_ne_bytes(buf) == 0
            },
            || self.anchor_window.sync(),
        );
        Ok(())
    }

    /// Release the lock, waking the next waiter if one has enqueued.
    pub fn release(&self) -> ChannelResult<()> {
        let my_node = self.my_index as i64;
        let cas_result = self.anchor_window.compare_and_swap_i64(
            my_node,
            NONE,
            self.anchor_rank,
            latest_disp(self.base_disp),
        )?;
        if cas_result == my_node {
            // No one enqueued after us; lock is now free.
            return Ok(());
        }
        // Someone is enqueuing concurrently: wait for their `next` write to
        // become visible, then wake them.
        let mut next_rank = NONE;
        poll_until(
            || {
                let mut buf = [0u8; 4];
                self.anchor_window
                    .get(&mut buf, self.anchor_rank, next_disp(self.base_disp, self.my_index))
                    .ok();
                let v = i32::from_ne_bytes(buf);
                if v != NONE as i32 {
                    next_rank = v as i64;
                    true
                } else {
                    false
                }
            },
            || self.anchor_window.sync(),
        );
        self.anchor_window.accumulate_replace_i32(
            0,
            self.anchor_rank,
            spin_disp(self.base_disp, next_rank as i32),
        )?;
        Ok(())
    }
}
