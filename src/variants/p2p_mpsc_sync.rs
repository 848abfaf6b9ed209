// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P MPSC SYNC: many senders, one receiver, no buffering. Every sender's
// `send` is the same synchronous send as SPSC SYNC. The receiver round-robins
// senders via nonblocking probe, advancing its cursor on every attempt (hit
// or miss) so a busy sender never starves the others (scenario S4).

use crate::error::ChannelResult;
use crate::substrate_ops::{self, Context};
use crate::variants::tags::PAYLOAD_OR_ACK;

pub(crate) struct P2pMpscSync {
    pub ctx: Context,
    pub is_receiver: bool,
    pub receiver_rank: i32,
    pub sender_ranks: Vec<i32>,
    pub idx_last_rank: usize,
}

impl P2pMpscSync {
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        substrate_ops::synchronous_send(&self.ctx, self.receiver_rank, PAYLOAD_OR_ACK, data)
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        loop {
            let idx = self.idx_last_rank % self.sender_ranks.len();
            let candidate = self.sender_ranks[idx];
            self.idx_last_rank = idx + 1;
            if substrate_ops::probe(&self.ctx, Some(candidate), PAYLOAD_OR_ACK).is_some() {
                substrate_ops::blocking_receive(&self.ctx, Some(candidate), PAYLOAD_OR_ACK, buf)?;
                return Ok(());
            }
        }
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
