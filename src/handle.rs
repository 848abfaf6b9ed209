// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The opaque channel handle. Construction is collective (see alloc.rs);
// every operation here after construction is purely local to the calling
// rank, matching the single-task-per-process concurrency model — there is
// never more than one live operation against the same handle at once.

use crate::error::ChannelError;
use crate::types::{Cardinality, Substrate};
use crate::variants::Variant;
use crate::ChannelResult;
use log::warn;

pub struct ChannelHandle {
    pub(crate) element_size: usize,
    pub(crate) capacity: i32,
    pub(crate) cardinality: Cardinality,
    pub(crate) substrate: Substrate,
    pub(crate) my_rank: i32,
    pub(crate) is_receiver: bool,
    pub(crate) receiver_ranks: Vec<i32>,
    pub(crate) sender_ranks: Vec<i32>,
    pub(crate) comm_size: i32,
    pub(crate) variant: Variant,
    pub(crate) freed: bool,
}

impl ChannelHandle {
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        if self.freed {
            return Err(ChannelError::Freed);
        }
        if self.is_receiver {
            warn!("channel_send called on a receiver-only handle (rank {})", self.my_rank);
            return Err(ChannelError::Misuse("send called on a receiver"));
        }
        if data.is_empty() || data.len() != self.element_size {
            return Err(ChannelError::Misuse("data length does not match element_size"));
        }
        self.variant.send(data)
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        if self.freed {
            return Err(ChannelError::Freed);
        }
        if !self.is_receiver {
            warn!("channel_receive called on a sender-only handle (rank {})", self.my_rank);
            return Err(ChannelError::Misuse("receive called on a sender"));
        }
        if buf.len() != self.element_size {
            return Err(ChannelError::Misuse("buffer length does not match element_size"));
        }
        self.variant.receive(buf)
    }

    /// Advisory: reports a lower bound (false negatives are acceptable),
    /// never blocks.
    pub fn peek(&mut self) -> ChannelResult<i32> {
        if self.freed {
            return Err(ChannelError::Freed);
        }
        self.variant.peek()
    }

    pub fn free(mut self) -> ChannelResult<()> {
        if self.freed {
            return Err(ChannelError::Freed);
        }
        let result = self.variant.free();
        self.freed = true;
        result
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn channel_type(&self) -> Cardinality {
        self.cardinality
    }

    pub fn comm_type(&self) -> Substrate {
        self.substrate
    }

    pub fn comm_size(&self) -> i32 {
        self.comm_size
    }

    pub fn sender_count(&self) -> i32 {
        self.sender_ranks.len() as i32
    }

    pub fn receiver_count(&self) -> i32 {
        self.receiver_ranks.len() as i32
    }

    pub fn is_receiver(&self) -> bool {
        self.is_receiver
    }
}
