// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P MPMC BUF: capacity is rounded up to a multiple of the receiver count
// and split evenly, so each sender tracks its own outstanding credit against
// every receiver individually. A sender's initial round-robin cursor is
// offset by `my_rank % sender_count` so concurrent senders do not all start
// by hammering the same receiver.

use crate::buffer_manager::{BufferOutcome, PROCESS_BUFFER};
use crate::error::{ChannelError, ChannelResult};
use crate::substrate_ops::{self, Context};
use crate::variants::tags::PAYLOAD_OR_ACK;

pub(crate) struct P2pMpmcBuf {
    pub ctx: Context,
    pub is_receiver: bool,
    pub receiver_ranks: Vec<i32>,
    pub sender_ranks: Vec<i32>,
    pub loc_capacity: i32,
    pub receiver_buffered_items: Vec<i32>,
    pub idx_last_rank: usize,
    /// Bytes this channel reserved in the process-wide attached buffer at
    /// construction; `free` shrinks it back by exactly this amount.
    pub buffer_reservation: i64,
}

impl P2pMpmcBuf {
    fn drain_acks(&mut self, idx: usize) {
        let receiver = self.receiver_ranks[idx];
        while substrate_ops::probe(&self.ctx, Some(receiver), PAYLOAD_OR_ACK).is_some() {
            let mut empty = [0u8; 0];
            let _ = substrate_ops::blocking_receive(&self.ctx, Some(receiver), PAYLOAD_OR_ACK, &mut empty);
            self.receiver_buffered_items[idx] -= 1;
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        loop {
            let idx = self.idx_last_rank % self.receiver_ranks.len();
            self.idx_last_rank = idx + 1;
            self.drain_acks(idx);
            if self.receiver_buffered_items[idx] < self.loc_capacity {
                let receiver = self.receiver_ranks[idx];
                substrate_ops::buffered_send(&self.ctx, receiver, PAYLOAD_OR_ACK, data)?;
                self.receiver_buffered_items[idx] += 1;
                return Ok(());
            }
        }
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
            let mut free_total = 0;
            for idx in 0..self.receiver_ranks.len() {
                self.drain_acks(idx);
                free_total += self.loc_capacity - self.receiver_buffered_items[idx];
            }
            Ok(free_total)
        }
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        if !self.is_receiver {
            for idx in 0..self.receiver_ranks.len() {
                while self.receiver_buffered_items[idx] > 0 {
                    let receiver = self.receiver_ranks[idx];
                    let mut empty = [0u8; 0];
                    substrate_ops::blocking_receive(&self.ctx, Some(receiver), PAYLOAD_OR_ACK, &mut empty)?;
                    self.receiver_buffered_items[idx] -= 1;
                }
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
