// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// The twelve concrete channel implementations, one module per
// (substrate, cardinality, discipline) combination. `handle.rs` dispatches
// into whichever variant `channel_alloc` selected; nothing outside this
// module ever matches on the individual variant types directly.

mod p2p_spsc_sync;
mod p2p_spsc_buf;
mod p2p_mpsc_sync;
mod p2p_mpsc_buf;
mod p2p_mpmc_sync;
mod p2p_mpmc_buf;
mod rma_spsc_sync;
mod rma_spsc_buf;
mod rma_mpsc_sync;
mod rma_mpsc_buf;
mod rma_mpmc_sync;
mod rma_mpmc_buf;

pub(crate) use p2p_spsc_sync::P2pSpscSync;
pub(crate) use p2p_spsc_buf::P2pSpscBuf;
pub(crate) use p2p_mpsc_sync::P2pMpscSync;
pub(crate) use p2p_mpsc_buf::P2pMpscBuf;
pub(crate) use p2p_mpmc_sync::P2pMpmcSync;
pub(crate) use p2p_mpmc_buf::P2pMpmcBuf;
pub(crate) use rma_spsc_sync::RmaSpscSync;
pub(crate) use rma_spsc_buf::RmaSpscBuf;
pub(crate) use rma_mpsc_sync::RmaMpscSync;
pub(crate) use rma_mpsc_buf::RmaMpscBuf;
pub(crate) use rma_mpmc_sync::RmaMpmcSync;
pub(crate) use rma_mpmc_buf::RmaMpmcBuf;

// Layout constants re-exported so `alloc.rs` can size each variant's window
// region and collectively initialize its sentinel words without duplicating
// the offsets each variant's own send/receive already uses.
pub(crate) use rma_mpsc_sync::{
    CURRENT_SENDER_DISP as RMA_MPSC_SYNC_CURRENT_SENDER_DISP,
    DATA_DISP as RMA_MPSC_SYNC_DATA_DISP,
};
pub(crate) use rma_mpmc_sync::{
    CURRENT_SENDER_DISP as RMA_MPMC_SYNC_CURRENT_SENDER_DISP,
    DATA_DISP as RMA_MPMC_SYNC_DATA_DISP,
    READY_DISP as RMA_MPMC_SYNC_READY_DISP,
    RECEIVER_LOCK_BASE as RMA_MPMC_SYNC_RECEIVER_LOCK_BASE,
    SENDER_LOCK_BASE as RMA_MPMC_SYNC_SENDER_LOCK_BASE,
};
pub(crate) use rma_mpsc_buf::{HEAD_DISP as RMA_MPSC_BUF_HEAD_DISP, TAIL_DISP as RMA_MPSC_BUF_TAIL_DISP};
pub(crate) use rma_mpmc_buf::{
    CONSUMER_LOCK_BASE as RMA_MPMC_BUF_CONSUMER_LOCK_BASE,
    HEAD_DISP as RMA_MPMC_BUF_HEAD_DISP,
    NO_WAITER as RMA_MPMC_BUF_NO_WAITER,
    TAIL_DISP as RMA_MPMC_BUF_TAIL_DISP,
    WAKE_TOKEN_DISP as RMA_MPMC_BUF_WAKE_TOKEN_DISP,
};

/// Dispatch tag selecting which of the twelve algorithms a `ChannelHandle`
/// was constructed with. Matched, never boxed behind a function pointer.
pub(crate) enum Variant {
    P2pSpscSync(P2pSpscSync),
    P2pSpscBuf(P2pSpscBuf),
    P2pMpscSync(P2pMpscSync),
    P2pMpscBuf(P2pMpscBuf),
    P2pMpmcSync(P2pMpmcSync),
    P2pMpmcBuf(P2pMpmcBuf),
    RmaSpscSync(RmaSpscSync),
    RmaSpscBuf(RmaSpscBuf),
    RmaMpscSync(RmaMpscSync),
    RmaMpscBuf(RmaMpscBuf),
    RmaMpmcSync(RmaMpmcSync),
    RmaMpmcBuf(RmaMpmcBuf),
}

impl Variant {
    pub(crate) fn send(&mut self, data: &[u8]) -> crate::ChannelResult<()> {
        match self {
            Variant::P2pSpscSync(v) => v.send(data),
            Variant::P2pSpscBuf(v) => v.send(data),
            Variant::P2pMpscSync(v) => v.send(data),
            Variant::P2pMpscBuf(v) => v.send(data),
            Variant::P2pMpmcSync(v) => v.send(data),
            Variant::P2pMpmcBuf(v) => v.send(data),
            Variant::RmaSpscSync(v) => v.send(data),
            Variant::RmaSpscBuf(v) => v.send(data),
            Variant::RmaMpscSync(v) => v.send(data),
            Variant::RmaMpscBuf(v) => v.send(data),
            Variant::RmaMpmcSync(v) => v.send(data),
            Variant::RmaMpmcBuf(v) => v.send(data),
        }
    }

    pub(crate) fn receive(&mut self, buf: &mut [u8]) -> crate::ChannelResult<()> {
        match self {
            Variant::P2pSpscSync(v) => v.receive(buf),
            Variant::P2pSpscBuf(v) => v.receive(buf),
            Variant::P2pMpscSync(v) => v.receive(buf),
            Variant::P2pMpscBuf(v) => v.receive(buf),
            Variant::P2pMpmcSync(v) => v.receive(buf),
            Variant::P2pMpmcBuf(v) => v.receive(buf),
            Variant::RmaSpscSync(v) => v.receive(buf),
            Variant::RmaSpscBuf(v) => v.receive(buf),
            Variant::RmaMpscSync(v) => v.receive(buf),
            Variant::RmaMpscBuf(v) => v.receive(buf),
            Variant::RmaMpmcSync(v) => v.receive(buf),
            Variant::RmaMpmcBuf(v) => v.receive(buf),
        }
    }

    pub(crate) fn peek(&mut self) -> crate::ChannelResult<i32> {
        match self {
            Variant::P2pSpscSync(v) => v.peek(),
            Variant::P2pSpscBuf(v) => v.peek(),
            Variant::P2pMpscSync(v) => v.peek(),
            Variant::P2pMpscBuf(v) => v.peek(),
            Variant::P2pMpmcSync(v) => v.peek(),
            Variant::P2pMpmcBuf(v) => v.peek(),
            Variant::RmaSpscSync(v) => v.peek(),
            Variant::RmaSpscBuf(v) => v.peek(),
            Variant::RmaMpscSync(v) => v.peek(),
            Variant::RmaMpscBuf(v) => v.peek(),
            Variant::RmaMpmcSync(v) => v.peek(),
            Variant::RmaMpmcBuf(v) => v.peek(),
        }
    }

    pub(crate) fn free(&mut self) -> crate::ChannelResult<()> {
        match self {
            Variant::P2pSpscSync(v) => v.free(),
            Variant::P2pSpscBuf(v) => v.free(),
            Variant::P2pMpscSync(v) => v.free(),
            Variant::P2pMpscBuf(v) => v.free(),
            Variant::P2pMpmcSync(v) => v.free(),
            Variant::P2pMpmcBuf(v) => v.free(),
            Variant::RmaSpscSync(v) => v.free(),
            Variant::RmaSpscBuf(v) => v.free(),
            Variant::RmaMpscSync(v) => v.free(),
            Variant::RmaMpscBuf(v) => v.free(),
            Variant::RmaMpmcSync(v) => v.free(),
            Variant::RmaMpmcBuf(v) => v.free(),
        }
    }
}

/// Shared by every P2P tag scheme: payload/ack share tag 0, MPMC SYNC
/// reserves the three tags above `comm_size` described in the external
/// interface section.
pub(crate) mod tags {
    pub const PAYLOAD_OR_ACK: i32 = 0;

    pub fn cancel(comm_size: i32) -> i32 {
        comm_size
    }
    pub fn acceptance(comm_size: i32) -> i32 {
        comm_size + 1
    }
    pub fn shutdown(comm_size: i32) -> i32 {
        comm_size + 2
    }
}
