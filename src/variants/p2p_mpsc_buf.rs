// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P MPSC BUF: capacity is one pool shared by every sender, tracked as
// `outstanding` locally to whichever sender is asking. The receiver
// round-robins senders for new payloads but acks the message's *actual*
// source, since ANY_SOURCE acks from other senders may interleave first.

use crate::buffer_manager::{BufferOutcome, PROCESS_BUFFER};
use crate::error::{ChannelError, ChannelResult};
use crate::substrate_ops::{self, Context};
use crate::variants::tags::PAYLOAD_OR_ACK;

pub(crate) struct P2pMpscBuf {
    pub ctx: Context,
    pub is_receiver: bool,
    pub receiver_rank: i32,
    pub sender_ranks: Vec<i32>,
    pub capacity: i32,
    pub outstanding: i32,
    pub idx_last_rank: usize,
    /// Bytes this channel reserved in the process-wide attached buffer at
    /// construction; `free` shrinks it back by exactly this amount.
    pub buffer_reservation: i64,
}

impl P2pMpscBuf {
    fn drain_acks(&mut self) {
        while substrate_ops::probe(&self.ctx, None, PAYLOAD_OR_ACK).is_some() {
            let mut empty = [0u8; 0];
            let _ = substrate_ops::blocking_receive(&self.ctx, None, PAYLOAD_OR_ACK, &mut empty);
            self.outstanding -= 1;
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        self.drain_acks();
        if self.outstanding >= self.capacity {
            let mut empty = [0u8; 0];
            substrate_ops::blocking_receive(&self.ctx, None, PAYLOAD_OR_ACK, &mut empty)?;
            self.outstanding -= 1;
        }
        substrate_ops::buffered_send(&self.ctx, self.receiver_rank, PAYLOAD_OR_ACK, data)?;
        self.outstanding += 1;
        Ok(())
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        loop {
            let idx = self.idx_last_rank % self.sender_ranks.len();
            let candidate = self.sender_ranks[idx];
            self.idx_last_rank = idx + 1;
            if let Some((source, _)) = substrate_ops::probe(&self.ctx, Some(candidate), PAYLOAD_OR_ACK) {
                substrate_ops::blocking_receive(&self.ctx, Some(source), PAYLOAD_OR_ACK, buf)?;
                return substrate_ops::buffered_send(&self.ctx, source, PAYLOAD_OR_ACK, &[]);
            }
        }
    }

    pub fn peek(&mut self) -> ChannelResult<i32> {
        if self.is_receiver {
            Ok(if substrate_ops::probe(&self.ctx, None, PAYLOAD_OR_ACK).is_some() {
                1
            } else {
                0
            })
        } else {
            self.drain_acks();
            Ok(self.capacity - self.outstanding)
        }
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        if !self.is_receiver {
            while self.outstanding > 0 {
                let mut empty = [0u8; 0];
                substrate_ops::blocking_receive(&self.ctx, None, PAYLOAD_OR_ACK, &mut empty)?;
                self.outstanding -= 1;
            }
        }
        match PROCESS_BUFFER.shrink(self.buffer_reservation) {
            BufferOutcome::FailedUnrecoverable => {
                Err(ChannelError::BufferFatal("attached buffer shrink underflow on free"))
            }
            BufferOutcome::Ok | BufferOutcome::FailedRestored => Ok(()),
        }
    }
}
