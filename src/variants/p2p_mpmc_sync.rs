// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P MPMC SYNC: many senders, many receivers, no buffering. A sender
// round-robins receivers, keeping at most one outstanding offer per
// receiver for the message it is currently trying to place; the first
// receiver to accept wins it, and every other outstanding offer is
// cancelled before the sender advances its cursor. Reserved tags: a
// sender's own rank is its offer tag, `comm_size` is cancel, `comm_size+1`
// is acceptance, `comm_size+2` is the shutdown tag used only by `free`.

use crate::buffer_manager::{BufferOutcome, PROCESS_BUFFER};
use crate::error::{ChannelError, ChannelResult};
use crate::substrate_ops::{self, Context};
use crate::variants::tags;

pub(crate) struct P2pMpmcSync {
    pub ctx: Context,
    pub is_receiver: bool,
    pub comm_size: i32,
    pub receiver_ranks: Vec<i32>,
    pub sender_ranks: Vec<i32>,
    pub idx_last_rank: usize,
    /// Monotonically increasing message counter; doubles as the acceptance
    /// payload a receiver echoes back so the sender knows which offer won.
    pub msg_number: i32,
    /// Per-receiver: does this sender currently have an uncancelled offer
    /// outstanding at that receiver for the in-flight message?
    pub requests_sent: Vec<bool>,
    /// Bytes this channel reserved in the process-wide attached buffer at
    /// construction; `free` shrinks it back by exactly this amount.
    pub buffer_reservation: i64,
}

impl P2pMpmcSync {
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        let offer_tag = self.ctx.my_rank;
        self.msg_number += 1;
        let my_msg = self.msg_number;
        for flag in self.requests_sent.iter_mut() {
            *flag = false;
        }

        let winner = loop {
            let idx = self.idx_last_rank % self.receiver_ranks.len();
            let receiver = self.receiver_ranks[idx];
            self.idx_last_rank = idx + 1;

            if !self.requests_sent[idx] {
                substrate_ops::buffered_send(&self.ctx, receiver, offer_tag, &my_msg.to_ne_bytes())?;
                self.requests_sent[idx] = true;
            }

            let accept_tag = tags::acceptance(self.comm_size);
            if let Some((source, _)) = substrate_ops::probe(&self.ctx, None, accept_tag) {
                let mut echoed = [0u8; 4];
                substrate_ops::blocking_receive(&self.ctx, Some(source), accept_tag, &mut echoed)?;
                if i32::from_ne_bytes(echoed) == my_msg {
                    break source;
                }
            }
        };

        // Transfer the payload to the winner, then cancel every other
        // outstanding offer so those receivers stop waiting on this message.
        substrate_ops::synchronous_send(&self.ctx, winner, offer_tag, data)?;
        let cancel_tag = tags::cancel(self.comm_size);
        for (idx, &receiver) in self.receiver_ranks.iter().enumerate() {
            if receiver != winner && self.requests_sent[idx] {
                substrate_ops::buffered_send(&self.ctx, receiver, cancel_tag, &[])?;
            }
            self.requests_sent[idx] = false;
        }
        Ok(())
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        loop {
            let mut offer = [0u8; 4];
            let (source, _offer_tag) = substrate_ops::blocking_receive(&self.ctx, None, -1, &mut offer)?;
            let accept_tag = tags::acceptance(self.comm_size);
            substrate_ops::buffered_send(&self.ctx, source, accept_tag, &offer)?;

            // The sender resolves exactly one accepted receiver and either
            // transfers the payload to it (tagged with its own rank) or
            // cancels every other acceptance (tagged `cancel_tag`). A losing
            // receiver only ever gets the cancel, so block for whichever
            // arrives and branch on the tag instead of assuming payload.
            let cancel_tag = tags::cancel(self.comm_size);
            let (_, resolved_tag) = substrate_ops::blocking_receive(&self.ctx, Some(source), -1, buf)?;
            if resolved_tag == cancel_tag {
                continue;
            }
            return Ok(());
        }
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        let shutdown_tag = tags::shutdown(self.comm_size);
        if !self.is_receiver {
            for &receiver in &self.receiver_ranks {
                substrate_ops::synchronous_send(&self.ctx, receiver, shutdown_tag, &[])?;
            }
        } else {
            for &sender in &self.sender_ranks {
                let mut empty = [0u8; 0];
                substrate_ops::blocking_receive(&self.ctx, Some(sender), shutdown_tag, &mut empty)?;
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
