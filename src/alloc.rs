// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Collective channel construction. Every step here runs on every rank in
// `comm`; a mismatch on any rank means every rank returns `None`, never a
// handle that's valid on some ranks and not others.

use crate::buffer_manager::PROCESS_BUFFER;
use crate::handle::ChannelHandle;
use crate::node::NONE;
use crate::ring::RingIndices;
use crate::substrate_ops::{self, Context, Window};
use crate::types::{Cardinality, Substrate};
use crate::variants::Variant;
use log::error;
use mpi::topology::{Communicator, UserCommunicator};
use std::os::raw::c_void;

const BSEND_OVERHEAD: i64 = 128;

/// Allocate a channel collectively across every rank in `comm`.
///
/// `comm` is never duplicated by the caller — each variant's own
/// initializer duplicates it internally so the channel gets a private
/// context, and the confirm-or-null collective always runs on this
/// original communicator so it still works if duplication itself fails.
pub fn channel_alloc(
    comm: &UserCommunicator,
    element_size: usize,
    capacity: i32,
    is_receiver: bool,
    cardinality: Cardinality,
    substrate: Substrate,
) -> Option<ChannelHandle> {
    let size = comm.size();
    let mut is_receiver_flags = vec![0i32; size as usize];
    substrate_ops::allgather_flags(comm, is_receiver as i32, &mut is_receiver_flags);

    let (reduced_elem, reduced_cap) =
        substrate_ops::allreduce_band(comm, (element_size as i32, capacity));

    let my_rank = comm.rank();
    let mismatch = reduced_elem != element_size as i32 || reduced_cap != capacity;
    if mismatch {
        error!(
            "channel_alloc: element_size/capacity mismatch across group (rank {my_rank})"
        );
        substrate_ops::confirm_or_null(comm, true);
        return None;
    }

    let mut receiver_ranks = Vec::new();
    let mut sender_ranks = Vec::new();
    for (rank, &flag) in is_receiver_flags.iter().enumerate() {
        if flag != 0 {
            receiver_ranks.push(rank as i32);
        } else {
            sender_ranks.push(rank as i32);
        }
    }

    if receiver_ranks.is_empty() || sender_ranks.is_empty() {
        error!("channel_alloc: group must contain at least one sender and one receiver");
        substrate_ops::confirm_or_null(comm, true);
        return None;
    }

    let variant = match (cardinality, substrate, capacity > 0) {
        (Cardinality::Spsc, Substrate::P2p, false) => {
            init_p2p_spsc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks)
        }
        (Cardinality::Spsc, Substrate::P2p, true) => init_p2p_spsc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
        (Cardinality::Mpsc, Substrate::P2p, false) => {
            init_p2p_mpsc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks)
        }
        (Cardinality::Mpsc, Substrate::P2p, true) => init_p2p_mpsc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
        (Cardinality::Mpmc, Substrate::P2p, false) => {
            init_p2p_mpmc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks)
        }
        (Cardinality::Mpmc, Substrate::P2p, true) => init_p2p_mpmc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
        (Cardinality::Spsc, Substrate::Rma, false) => {
            init_rma_spsc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks)
        }
        (Cardinality::Spsc, Substrate::Rma, true) => init_rma_spsc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
        (Cardinality::Mpsc, Substrate::Rma, false) => {
            init_rma_mpsc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks, element_size)
        }
        (Cardinality::Mpsc, Substrate::Rma, true) => init_rma_mpsc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
        (Cardinality::Mpmc, Substrate::Rma, false) => {
            init_rma_mpmc_sync(comm, is_receiver, &receiver_ranks, &sender_ranks, element_size)
        }
        (Cardinality::Mpmc, Substrate::Rma, true) => init_rma_mpmc_buf(
            comm,
            is_receiver,
            &receiver_ranks,
            &sender_ranks,
            element_size,
            capacity,
        ),
    };

    let variant = match variant {
        Some(v) => v,
        None => {
            substrate_ops::confirm_or_null(comm, true);
            return None;
        }
    };

    if substrate_ops::confirm_or_null(comm, false) {
        return None;
    }

    Some(ChannelHandle {
        element_size,
        capacity,
        cardinality,
        substrate,
        my_rank,
        is_receiver,
        receiver_ranks,
        sender_ranks,
        comm_size: size,
        variant,
        freed: false,
    })
}

fn leak_zeroed(size: usize) -> *mut c_void {
    let region = vec![0u8; size].into_boxed_slice();
    Box::into_raw(region) as *mut c_void
}

// ---- P2P variants --------------------------------------------------------

fn init_p2p_spsc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let peer_rank = if is_receiver { sender_ranks[0] } else { receiver_ranks[0] };
    Some(Variant::P2pSpscSync(crate::variants::P2pSpscSync {
        ctx,
        is_receiver,
        peer_rank,
    }))
}

fn init_p2p_spsc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let reservation = if is_receiver {
        BSEND_OVERHEAD * capacity as i64
    } else {
        (element_size as i64 + BSEND_OVERHEAD) * capacity as i64
    };
    if !matches!(PROCESS_BUFFER.append(reservation), crate::buffer_manager::BufferOutcome::Ok) {
        return None;
    }
    let ctx = Context::duplicate(comm);
    let peer_rank = if is_receiver { sender_ranks[0] } else { receiver_ranks[0] };
    Some(Variant::P2pSpscBuf(crate::variants::P2pSpscBuf {
        ctx,
        is_receiver,
        peer_rank,
        capacity,
        outstanding: 0,
        buffer_reservation: reservation,
    }))
}

fn init_p2p_mpsc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    Some(Variant::P2pMpscSync(crate::variants::P2pMpscSync {
        ctx,
        is_receiver,
        receiver_rank: receiver_ranks[0],
        sender_ranks: sender_ranks.to_vec(),
        idx_last_rank: 0,
    }))
}

fn init_p2p_mpsc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let reservation = if is_receiver {
        BSEND_OVERHEAD * capacity as i64 * sender_ranks.len() as i64
    } else {
        (element_size as i64 + BSEND_OVERHEAD) * capacity as i64
    };
    if !matches!(PROCESS_BUFFER.append(reservation), crate::buffer_manager::BufferOutcome::Ok) {
        return None;
    }
    let ctx = Context::duplicate(comm);
    Some(Variant::P2pMpscBuf(crate::variants::P2pMpscBuf {
        ctx,
        is_receiver,
        receiver_rank: receiver_ranks[0],
        sender_ranks: sender_ranks.to_vec(),
        capacity,
        outstanding: 0,
        idx_last_rank: 0,
        buffer_reservation: reservation,
    }))
}

fn init_p2p_mpmc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
) -> Option<Variant> {
    let reservation = if is_receiver {
        (4 + BSEND_OVERHEAD) * sender_ranks.len() as i64
    } else {
        (4 + BSEND_OVERHEAD) * receiver_ranks.len() as i64
    };
    if !matches!(PROCESS_BUFFER.append(reservation), crate::buffer_manager::BufferOutcome::Ok) {
        return None;
    }
    let ctx = Context::duplicate(comm);
    let comm_size = ctx.size;
    Some(Variant::P2pMpmcSync(crate::variants::P2pMpmcSync {
        comm_size,
        requests_sent: vec![false; receiver_ranks.len()],
        receiver_ranks: receiver_ranks.to_vec(),
        sender_ranks: sender_ranks.to_vec(),
        idx_last_rank: 0,
        msg_number: 0,
        ctx,
        is_receiver,
        buffer_reservation: reservation,
    }))
}

fn init_p2p_mpmc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let receiver_count = receiver_ranks.len() as i32;
    let rounded_capacity = if capacity % receiver_count == 0 {
        capacity
    } else {
        capacity + (receiver_count - capacity % receiver_count)
    };
    let loc_capacity = rounded_capacity / receiver_count;
    let reservation = if is_receiver {
        BSEND_OVERHEAD * rounded_capacity as i64 * sender_ranks.len() as i64
    } else {
        receiver_count as i64 * (element_size as i64 + BSEND_OVERHEAD) * rounded_capacity as i64
    };
    if !matches!(PROCESS_BUFFER.append(reservation), crate::buffer_manager::BufferOutcome::Ok) {
        return None;
    }
    let ctx = Context::duplicate(comm);
    let my_rank = ctx.my_rank;
    let idx_last_rank = if sender_ranks.is_empty() {
        0
    } else {
        (my_rank as usize) % sender_ranks.len().max(1)
    };
    Some(Variant::P2pMpmcBuf(crate::variants::P2pMpmcBuf {
        ctx,
        is_receiver,
        receiver_ranks: receiver_ranks.to_vec(),
        sender_ranks: sender_ranks.to_vec(),
        loc_capacity,
        receiver_buffered_items: vec![0; receiver_ranks.len()],
        idx_last_rank,
        buffer_reservation: reservation,
    }))
}

// ---- RMA variants ---------------------------------------------------------

fn init_rma_spsc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let region_size = 4096;
    let base = leak_zeroed(region_size);
    let window = Window::create(&ctx, base, region_size).ok()?;
    let peer_rank = if is_receiver { sender_ranks[0] } else { receiver_ranks[0] };
    Some(Variant::RmaSpscSync(crate::variants::RmaSpscSync {
        window,
        is_receiver,
        peer_rank,
        my_rank: ctx.my_rank,
    }))
}

fn init_rma_spsc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let slots = (capacity as usize + 1) * element_size;
    let region_size = 8 + slots;
    let base = leak_zeroed(region_size);
    let window = Window::create(&ctx, base, region_size).ok()?;
    let peer_rank = if is_receiver { sender_ranks[0] } else { receiver_ranks[0] };
    Some(Variant::RmaSpscBuf(crate::variants::RmaSpscBuf {
        window,
        is_receiver,
        peer_rank,
        my_rank: ctx.my_rank,
        element_size,
        indices: RingIndices::new(capacity),
    }))
}

fn init_rma_mpsc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    _sender_ranks: &[i32],
    element_size: usize,
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let region_size = (crate::variants::RMA_MPSC_SYNC_DATA_DISP as usize + element_size).max(4096);
    let base = leak_zeroed(region_size);
    let window = Window::create(&ctx, base, region_size).ok()?;
    if is_receiver {
        window.lock_all();
        window
            .fetch_and_replace_i64(NONE, ctx.my_rank, crate::mcs_lock::latest_disp(0))
            .ok()?;
        window
            .accumulate_replace_i32(-1, ctx.my_rank, crate::variants::RMA_MPSC_SYNC_CURRENT_SENDER_DISP)
            .ok()?;
        window.unlock_all();
    }
    substrate_ops::barrier(&ctx.comm);
    Some(Variant::RmaMpscSync(crate::variants::RmaMpscSync {
        window,
        is_receiver,
        my_rank: ctx.my_rank,
        my_lock_index: ctx.my_rank,
        receiver_rank: receiver_ranks[0],
        element_size,
    }))
}

fn init_rma_mpsc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let node_size = 8 + element_size;
    let sender_region_size = (capacity as usize + 1) * node_size;
    let sender_window = if !is_receiver {
        let base = leak_zeroed(sender_region_size);
        Some(Window::create(&ctx, base, sender_region_size).ok()?)
    } else {
        None
    };
    let receiver_region_size = (capacity as usize + 1) * node_size + 16;
    let receiver_base = leak_zeroed(receiver_region_size);
    let receiver_window = Window::create(&ctx, receiver_base, receiver_region_size).ok()?;
    if is_receiver {
        receiver_window.lock_all();
        receiver_window
            .fetch_and_replace_i64(NONE, ctx.my_rank, crate::variants::RMA_MPSC_BUF_HEAD_DISP)
            .ok()?;
        receiver_window
            .fetch_and_replace_i64(NONE, ctx.my_rank, crate::variants::RMA_MPSC_BUF_TAIL_DISP)
            .ok()?;
        receiver_window.unlock_all();
    }
    substrate_ops::barrier(&ctx.comm);
    Some(Variant::RmaMpscBuf(crate::variants::RmaMpscBuf {
        sender_window,
        receiver_window,
        is_receiver,
        my_rank: ctx.my_rank,
        receiver_rank: receiver_ranks[0],
        capacity,
        element_size,
        write_indices: RingIndices::new(capacity),
        read_indices: vec![0; sender_ranks.len()],
        sender_ranks: sender_ranks.to_vec(),
    }))
}

fn init_rma_mpmc_sync(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    _sender_ranks: &[i32],
    element_size: usize,
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let anchor_rank = receiver_ranks[0];
    let region_size = (crate::variants::RMA_MPMC_SYNC_DATA_DISP as usize + element_size).max(8192);
    let base = leak_zeroed(region_size);
    let window = Window::create(&ctx, base, region_size).ok()?;
    if ctx.my_rank == anchor_rank {
        window.lock_all();
        window
            .fetch_and_replace_i64(
                NONE,
                ctx.my_rank,
                crate::mcs_lock::latest_disp(crate::variants::RMA_MPMC_SYNC_SENDER_LOCK_BASE),
            )
            .ok()?;
        window
            .fetch_and_replace_i64(
                NONE,
                ctx.my_rank,
                crate::mcs_lock::latest_disp(crate::variants::RMA_MPMC_SYNC_RECEIVER_LOCK_BASE),
            )
            .ok()?;
        window
            .accumulate_replace_i32(-1, ctx.my_rank, crate::variants::RMA_MPMC_SYNC_CURRENT_SENDER_DISP)
            .ok()?;
        window
            .accumulate_replace_i32(0, ctx.my_rank, crate::variants::RMA_MPMC_SYNC_READY_DISP)
            .ok()?;
        window.unlock_all();
    }
    substrate_ops::barrier(&ctx.comm);
    Some(Variant::RmaMpmcSync(crate::variants::RmaMpmcSync {
        anchor_window: window,
        is_receiver,
        my_rank: ctx.my_rank,
        anchor_rank,
        my_sender_lock_index: ctx.my_rank,
        my_receiver_lock_index: ctx.my_rank,
        element_size,
    }))
}

fn init_rma_mpmc_buf(
    comm: &UserCommunicator,
    is_receiver: bool,
    receiver_ranks: &[i32],
    _sender_ranks: &[i32],
    element_size: usize,
    capacity: i32,
) -> Option<Variant> {
    let ctx = Context::duplicate(comm);
    let node_size = 8 + element_size;
    let sender_region_size = (capacity as usize + 1) * node_size;
    let sender_window = if !is_receiver {
        let base = leak_zeroed(sender_region_size);
        Some(Window::create(&ctx, base, sender_region_size).ok()?)
    } else {
        None
    };
    let shared_owner_rank = receiver_ranks[0];
    let shared_region_size = 8192;
    let shared_base = leak_zeroed(shared_region_size);
    let shared_window = Window::create(&ctx, shared_base, shared_region_size).ok()?;
    if ctx.my_rank == shared_owner_rank {
        shared_window.lock_all();
        shared_window
            .fetch_and_replace_i64(NONE, ctx.my_rank, crate::variants::RMA_MPMC_BUF_HEAD_DISP)
            .ok()?;
        shared_window
            .fetch_and_replace_i64(NONE, ctx.my_rank, crate::variants::RMA_MPMC_BUF_TAIL_DISP)
            .ok()?;
        shared_window
            .accumulate_replace_i32(
                crate::variants::RMA_MPMC_BUF_NO_WAITER,
                ctx.my_rank,
                crate::variants::RMA_MPMC_BUF_WAKE_TOKEN_DISP,
            )
            .ok()?;
        shared_window.unlock_all();
    }
    substrate_ops::barrier(&ctx.comm);
    Some(Variant::RmaMpmcBuf(crate::variants::RmaMpmcBuf {
        sender_window,
        shared_window,
        is_receiver,
        my_rank: ctx.my_rank,
        shared_owner_rank,
        my_consumer_lock_index: ctx.my_rank,
        capacity,
        element_size,
        write_indices: RingIndices::new(capacity),
    }))
}
