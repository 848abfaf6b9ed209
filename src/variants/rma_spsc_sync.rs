// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RMA SPSC SYNC: no persistent ring, just a single-slot ready flag in the
// receiver's window. The sender waits for the slot to read "consumed"
// before it may put the next element; the receiver waits for "ready"
// before it may read.

use crate::error::ChannelResult;
use crate::spin::poll_until;
use crate::substrate_ops::Window;

const READY_DISP: i64 = 0;
const DATA_DISP: i64 = 8;

pub(crate) struct RmaSpscSync {
    pub window: Window,
    pub is_receiver: bool,
    pub peer_rank: i32,
    pub my_rank: i32,
}

impl RmaSpscSync {
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        self.window.lock_all();
        poll_until(
            || {
                let mut buf = [0u8; 4];
                self.window.get(&mut buf, self.peer_rank, READY_DISP).ok();
                i32::from_ne_bytes(buf) == 0
            },
            || self.window.sync(),
        );
        self.window.put(data, self.peer_rank, DATA_DISP)?;
        self.window.flush(self.peer_rank);
        self.window.accumulate_replace_i32(1, self.peer_rank, READY_DISP)?;
        self.window.unlock_all();
        Ok(())
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        self.window.lock_all();
        poll_until(
            || {
                let mut flag = [0u8; 4];
                self.window.get(&mut flag, self.my_rank, READY_DISP).ok();
                i32::from_ne_bytes(flag) != 0
            },
            || self.window.sync(),
        );
        self.window.get(buf, self.my_rank, DATA_DISP)?;
        self.window.accumulate_replace_i32(0, self.my_rank, READY_DISP)?;
        self.window.unlock_all();
        Ok(())
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
