// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RMA MPMC SYNC: two distributed MCS locks, both anchored at the
// lowest-ranked receiver — a sender-lock serializing which sender is
// currently allowed to place a message, and a receiver-lock serializing
// which receiver is currently allowed to take one. Holding both locks at
// once pairs exactly one sender with exactly one receiver per rendezvous;
// every other sender and receiver waits its turn in strict MCS arrival
// order (scenario S6: no deadlock with 3 senders and 3 receivers).

use crate::error::ChannelResult;
use crate::mcs_lock::McsLock;
use crate::spin::poll_until;
use crate::substrate_ops::Window;

// Two independent MCS locks share this window; each gets its own
// non-overlapping region so their `latest`/`next`/`spin` words never alias.
pub(crate) const SENDER_LOCK_BASE: i64 = 0;
pub(crate) const RECEIVER_LOCK_BASE: i64 = 2048;
pub(crate) const CURRENT_SENDER_DISP: i64 = 4096;
pub(crate) const READY_DISP: i64 = 4104;
pub(crate) const DATA_DISP: i64 = 4112;

pub(crate) struct RmaMpmcSync {
    pub anchor_window: Window,
    pub is_receiver: bool,
    pub my_rank: i32,
    pub anchor_rank: i32,
    pub my_sender_lock_index: i32,
    pub my_receiver_lock_index: i32,
    pub element_size: usize,
}

impl RmaMpmcSync {
    fn sender_lock(&self) -> McsLock<'_> {
        McsLock {
            anchor_window: &self.anchor_window,
            anchor_rank: self.anchor_rank,
            base_disp: SENDER_LOCK_BASE,
            my_index: self.my_sender_lock_index,
        }
    }

    fn receiver_lock(&self) -> McsLock<'_> {
        McsLock {
            anchor_window: &self.anchor_window,
            anchor_rank: self.anchor_rank,
            base_disp: RECEIVER_LOCK_BASE,
            my_index: self.my_receiver_lock_index,
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        let lock = self.sender_lock();
        lock.acquire()?;
        self.anchor_window.put(data, self.anchor_rank, DATA_DISP)?;
        self.anchor_window.flush(self.anchor_rank);
        self.anchor_window
            .accumulate_replace_i32(self.my_rank, self.anchor_rank, CURRENT_SENDER_DISP)?;
        self.anchor_window
            .accumulate_replace_i32(1, self.anchor_rank, READY_DISP)?;
        poll_until(
            || {
                let mut buf = [0u8; 4];
                self.anchor_window.get(&mut buf, self.anchor_rank, READY_DISP).ok();
                i32::from_ne_bytes(buf) == 0
            },
            || self.anchor_window.sync(),
        );
        lock.release()
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        let lock = self.receiver_lock();
        lock.acquire()?;
        poll_until(
            || {
                let mut ready = [0u8; 4];
                self.anchor_window.get(&mut ready, self.anchor_rank, READY_DISP).ok();
                i32::from_ne_bytes(ready) != 0
            },
            || self.anchor_window.sync(),
        );
        self.anchor_window.get(buf, self.anchor_rank, DATA_DISP)?;
        self.anchor_window
            .accumulate_replace_i32(0, self.anchor_rank, READY_DISP)?;
        lock.release()
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
