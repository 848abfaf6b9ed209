// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// P2P SPSC SYNC: the simplest variant. A synchronous send rendezvous
// directly with a blocking receive; there is no buffering state at all.

use crate::error::ChannelResult;
use crate::substrate_ops::{self, Context};
use crate::variants::tags::PAYLOAD_OR_ACK;

pub(crate) struct P2pSpscSync {
    pub ctx: Context,
    pub is_receiver: bool,
    /// The sole peer on the other side of this channel.
    pub peer_rank: i32,
}

impl P2pSpscSync {
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        substrate_ops::synchronous_send(&self.ctx, self.peer_rank, PAYLOAD_OR_ACK, data)
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        substrate_ops::blocking_receive(&self.ctx, None, PAYLOAD_OR_ACK, buf).map(|_| ())
    }

    /// SYNC cardinality-one variants have no credit state to report.
    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
