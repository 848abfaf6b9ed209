// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RMA MPSC SYNC: one distributed MCS lock anchored at the receiver,
// generalized so every sender competes for one rendezvous slot per message.
// `current_sender` identifies who currently holds the rendezvous;
// `latest_sender` is the MCS lock's own `latest` word (see mcs_lock.rs).

use crate::error::ChannelResult;
use crate::mcs_lock::McsLock;
use crate::spin::poll_until;
use crate::substrate_ops::Window;

pub(crate) const CURRENT_SENDER_DISP: i64 = 512;
pub(crate) const DATA_DISP: i64 = 520;
const DONE_DISP: i64 = 516;

pub(crate) struct RmaMpscSync {
    pub window: Window,
    pub is_receiver: bool,
    pub my_rank: i32,
    pub my_lock_index: i32,
    pub receiver_rank: i32,
    pub element_size: usize,
}

impl RmaMpscSync {
    fn lock(&self) -> McsLock<'_> {
        McsLock {
            anchor_window: &self.window,
            anchor_rank: self.receiver_rank,
            base_disp: 0,
            my_index: self.my_lock_index,
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        let lock = self.lock();
        lock.acquire()?;
        self.window.put(data, self.receiver_rank, DATA_DISP)?;
        self.window.flush(self.receiver_rank);
        self.window
            .accumulate_replace_i32(self.my_rank, self.receiver_rank, CURRENT_SENDER_DISP as i64)?;
        poll_until(
            || {
                let mut buf = [0u8; 4];
                self.window.get(&mut buf, self.receiver_rank, DONE_DISP).ok();
                i32::from_ne_bytes(buf) != 0
            },
            || self.window.sync(),
        );
        self.window
            .accumulate_replace_i32(0, self.receiver_rank, DONE_DISP)?;
        lock.release()
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        poll_until(
            || {
                let mut flag = [0u8; 4];
                self.window.get(&mut flag, self.my_rank, CURRENT_SENDER_DISP).ok();
                i32::from_ne_bytes(flag) != -1
            },
            || self.window.sync(),
        );
        self.window.get(buf, self.my_rank, DATA_DISP)?;
        self.window
            .accumulate_replace_i32(-1, self.my_rank, CURRENT_SENDER_DISP as i64)?;
        self.window
            .accumulate_replace_i32(1, self.my_rank, DONE_DISP)?;
        Ok(())
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
