// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P SPSC BUF: credit-based flow control between exactly one sender and
// one receiver. `outstanding` tracks buffered, unacknowledged sends on the
// sender side; the receiver replies with a zero-byte ack per receive.

use crate::buffer_manager::{BufferOutcome, PROCESS_BUFFER};
use crate::error::{ChannelError, ChannelResult};
use crate::substrate_ops::{self, Context};
use crate::variants::tags::PAYLOAD_OR_ACK;

pub(crate) struct P2pSpscBuf {
    pub ctx: Context,
    pub is_receiver: bool,
    pub peer_rank: i32,
    pub capacity: i32,
    pub outstanding: i32,
    /// Bytes this channel reserved in the process-wide attached buffer at
    /// construction; `free` shrinks it back by exactly this amount.
    pub buffer_reservation: i64,
}

impl P2pSpscBuf {
    fn drain_acks(&mut self) {
        while substrate_ops::probe(&self.ctx, Some(self.peer_rank), PAYLOAD_OR_ACK).is_some() {
            let mut empty = [0u8; 0];
            let _ = substrate_ops::blocking_receive(
                &self.ctx,
                Some(self.peer_rank),
                PAYLOAD_OR_ACK,
                &mut empty,
            );
            self.outstanding -= 1;
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        self.drain_acks();
        if self.outstanding >= self.capacity {
            // Block for exactly one ack to free a credit slot.
            let mut empty = [0u8; 0];
            substrate_ops::blocking_receive(&self.ctx, Some(self.peer_rank), PAYLOAD_OR_ACK, &mut empty)?;
            self.outstanding -= 1;
        }
        substrate_ops::buffered_send(&self.ctx, self.peer_rank, PAYLOAD_OR_ACK, data)?;
        self.outstanding += 1;
        Ok(())
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        substrate_ops::blocking_receive(&self.ctx, Some(self.peer_rank), PAYLOAD_OR_ACK, buf)?;
        substrate_ops::buffered_send(&self.ctx, self.peer_rank, PAYLOAD_OR_ACK, &[])
    }

    pub fn peek(&mut self) -> ChannelResult<i32> {
        if self.is_receiver {
            Ok(if substrate_ops::probe(&self.ctx, Some(self.peer_rank), PAYLOAD_OR_ACK).is_some() {
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
                substrate_ops::blocking_receive(
                    &self.ctx,
                    Some(self.peer_rank),
                    PAYLOAD_OR_ACK,
                    &mut empty,
                )?;
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
