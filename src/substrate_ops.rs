// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Thin wrapper over the `mpi` crate (rsmpi). Two-sided operations and
// collectives go through rsmpi's safe API; buffered sends and one-sided RMA
// atomics route through `mpi::ffi`, since rsmpi's safe surface does not
// cover `MPI_Bsend`/`MPI_Buffer_attach` or RMA atomics directly. Every raw
// call here is the one place in the crate where that distinction is made
// explicit — variant code never calls into `mpi::ffi` itself.

use crate::error::{substrate_failure, ChannelError};
use mpi::collective::CommunicatorCollectives;
use mpi::point_to_point as p2p;
use mpi::topology::{Communicator, Process, UserCommunicator};
use mpi::Tag;
use std::os::raw::c_void;

/// A private, duplicated communicator context for one channel.
pub struct Context {
    pub comm: UserCommunicator,
    pub my_rank: i32,
    pub size: i32,
}

impl Context {
    pub fn duplicate(comm: &UserCommunicator) -> Self {
        let dup = comm.duplicate();
        let my_rank = dup.rank();
        let size = dup.size();
        Context {
            comm: dup,
            my_rank,
            size,
        }
    }

    pub fn process(&self, rank: i32) -> Process<'_, UserCommunicator> {
        self.comm.process_at_rank(rank)
    }
}

/// Blocking synchronous send (`MPI_Ssend` semantics) — used by every SYNC
/// P2P variant's payload transfer.
pub fn synchronous_send(ctx: &Context, dest: i32, tag: Tag, data: &[u8]) -> Result<(), ChannelError> {
    ctx.process(dest)
        .synchronous_send_with_tag(data, tag);
    Ok(())
}

/// Blocking receive from a specific or `ANY_SOURCE` rank.
pub fn blocking_receive(
    ctx: &Context,
    source: Option<i32>,
    tag: Tag,
    buf: &mut [u8],
) -> Result<(i32, Tag), ChannelError> {
    let (_, status) = match source {
        Some(rank) => ctx.process(rank).receive_with_tag_into(buf, tag),
        None => ctx.comm.any_process().receive_with_tag_into(buf, tag),
    };
    Ok((status.source_rank(), status.tag()))
}

/// Nonblocking probe: does a matching message already exist?
pub fn probe(ctx: &Context, source: Option<i32>, tag: Tag) -> Option<(i32, Tag)> {
    let status = match source {
        Some(rank) => ctx.process(rank).immediate_probe_with_tag(tag),
        None => ctx.comm.any_process().immediate_probe_with_tag(tag),
    };
    status.map(|s| (s.source_rank(), s.tag()))
}

/// Buffered send (`MPI_Bsend`), relying on a process-wide attached buffer
/// the `BufferManager` has already reserved space in.
pub fn buffered_send(ctx: &Context, dest: i32, tag: Tag, data: &[u8]) -> Result<(), ChannelError> {
    let rc = unsafe {
        mpi::ffi::MPI_Bsend(
            data.as_ptr() as *mut c_void,
            data.len() as i32,
            mpi::ffi::RSMPI_BYTE,
            dest,
            tag,
            ctx.comm.as_raw(),
        )
    };
    if rc != mpi::ffi::MPI_SUCCESS as i32 {
        return Err(substrate_failure(format!("MPI_Bsend failed with code {rc}")));
    }
    Ok(())
}

/// Attach `size` bytes of process-wide buffered-send storage. Backed by a
/// leaked allocation: the process never shrinks the raw OS buffer below
/// what `MPI_Buffer_attach` was last given, matching the reference
/// implementation's own one-shot-growth behaviour.
pub fn attach_buffer(size: usize) -> Result<(), ChannelError> {
    let layout = vec![0u8; size].into_boxed_slice();
    let ptr = Box::into_raw(layout) as *mut c_void;
    let rc = unsafe { mpi::ffi::MPI_Buffer_attach(ptr, size as i32) };
    if rc != mpi::ffi::MPI_SUCCESS as i32 {
        return Err(substrate_failure(format!(
            "MPI_Buffer_attach({size}) failed with code {rc}"
        )));
    }
    Ok(())
}

pub fn detach_buffer() {
    let mut ptr: *mut c_void = std::ptr::null_mut();
    let mut size: i32 = 0;
    unsafe {
        mpi::ffi::MPI_Buffer_detach(&mut ptr as *mut _ as *mut c_void, &mut size);
    }
}

/// One-sided RMA window over a region this process owns. Every atomic
/// touching a word another rank may concurrently read goes through
/// `fetch_and_op`/`compare_and_swap`/`accumulate_replace`; plain `put`/`get`
/// is reserved for payload bytes and offsets exclusively owned at that
/// point in the protocol.
pub struct Window {
    raw: mpi::ffi::MPI_Win,
    base: *mut c_void,
}

unsafe impl Send for Window {}

impl Window {
    pub fn create(ctx: &Context, base: *mut c_void, size: usize) -> Result<Self, ChannelError> {
        let mut win: mpi::ffi::MPI_Win = std::ptr::null_mut();
        let rc = unsafe {
            mpi::ffi::MPI_Win_create(
                base,
                size as mpi::ffi::MPI_Aint,
                1,
                mpi::ffi::RSMPI_INFO_NULL,
                ctx.comm.as_raw(),
                &mut win,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!("MPI_Win_create failed with code {rc}")));
        }
        Ok(Window { raw: win, base })
    }

    pub fn lock_all(&self) {
        unsafe { mpi::ffi::MPI_Win_lock_all(0, self.raw) };
    }

    pub fn unlock_all(&self) {
        unsafe { mpi::ffi::MPI_Win_unlock_all(self.raw) };
    }

    /// Refresh the caller's local view of a remote window's memory. Called
    /// between busy-wait polls, never as a substitute for a real flush.
    pub fn sync(&self) {
        unsafe { mpi::ffi::MPI_Win_sync(self.raw) };
    }

    pub fn flush(&self, rank: i32) {
        unsafe { mpi::ffi::MPI_Win_flush(rank, self.raw) };
    }

    pub fn put(&self, data: &[u8], target_rank: i32, target_disp: i64) -> Result<(), ChannelError> {
        let rc = unsafe {
            mpi::ffi::MPI_Put(
                data.as_ptr() as *mut c_void,
                data.len() as i32,
                mpi::ffi::RSMPI_BYTE,
                target_rank,
                target_disp as mpi::ffi::MPI_Aint,
                data.len() as i32,
                mpi::ffi::RSMPI_BYTE,
                self.raw,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!("MPI_Put failed with code {rc}")));
        }
        Ok(())
    }

    pub fn get(&self, out: &mut [u8], target_rank: i32, target_disp: i64) -> Result<(), ChannelError> {
        let rc = unsafe {
            mpi::ffi::MPI_Get(
                out.as_mut_ptr() as *mut c_void,
                out.len() as i32,
                mpi::ffi::RSMPI_BYTE,
                target_rank,
                target_disp as mpi::ffi::MPI_Aint,
                out.len() as i32,
                mpi::ffi::RSMPI_BYTE,
                self.raw,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!("MPI_Get failed with code {rc}")));
        }
        Ok(())
    }

    /// `MPI_Accumulate` with `MPI_REPLACE` — used to push an updated index
    /// word (ring read/write cursor, MCS `latest`/`next`) to a remote rank.
    pub fn accumulate_replace_i32(
        &self,
        value: i32,
        target_rank: i32,
        target_disp: i64,
    ) -> Result<(), ChannelError> {
        let rc = unsafe {
            mpi::ffi::MPI_Accumulate(
                &value as *const i32 as *mut c_void,
                1,
                mpi::ffi::RSMPI_INT32_T,
                target_rank,
                target_disp as mpi::ffi::MPI_Aint,
                1,
                mpi::ffi::RSMPI_INT32_T,
                mpi::ffi::RSMPI_REPLACE,
                self.raw,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!("MPI_Accumulate failed with code {rc}")));
        }
        Ok(())
    }

    /// `MPI_Fetch_and_op` with `MPI_REPLACE` over a 64-bit word — the
    /// atomic tail-exchange the Michael-Scott enqueue relies on.
    pub fn fetch_and_replace_i64(
        &self,
        new_value: i64,
        target_rank: i32,
        target_disp: i64,
    ) -> Result<i64, ChannelError> {
        let mut previous: i64 = 0;
        let rc = unsafe {
            mpi::ffi::MPI_Fetch_and_op(
                &new_value as *const i64 as *mut c_void,
                &mut previous as *mut i64 as *mut c_void,
                mpi::ffi::RSMPI_INT64_T,
                target_rank,
                target_disp as mpi::ffi::MPI_Aint,
                mpi::ffi::RSMPI_REPLACE,
                self.raw,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!(
                "MPI_Fetch_and_op failed with code {rc}"
            )));
        }
        Ok(previous)
    }

    /// `MPI_Compare_and_swap` over a 64-bit word — used to release an MCS
    /// lock (`latest`) or detach a Michael-Scott queue's `tail`.
    pub fn compare_and_swap_i64(
        &self,
        expected: i64,
        new_value: i64,
        target_rank: i32,
        target_disp: i64,
    ) -> Result<i64, ChannelError> {
        let mut result: i64 = 0;
        let rc = unsafe {
            mpi::ffi::MPI_Compare_and_swap(
                &new_value as *const i64 as *mut c_void,
                &expected as *const i64 as *mut c_void,
                &mut result as *mut i64 as *mut c_void,
                mpi::ffi::RSMPI_INT64_T,
                target_rank,
                target_disp as mpi::ffi::MPI_Aint,
                self.raw,
            )
        };
        if rc != mpi::ffi::MPI_SUCCESS as i32 {
            return Err(substrate_failure(format!(
                "MPI_Compare_and_swap failed with code {rc}"
            )));
        }
        Ok(result)
    }

    pub fn free(self) {
        unsafe { mpi::ffi::MPI_Win_free(&mut { self.raw }) };
    }

    pub fn base_ptr(&self) -> *mut c_void {
        self.base
    }
}

/// Blocking all-gather of each rank's `is_receiver` flag.
pub fn allgather_flags(comm: &UserCommunicator, local_flag: i32, out: &mut [i32]) {
    comm.all_gather_into(&local_flag, out);
}

pub fn allreduce_band(comm: &UserCommunicator, local: (i32, i32)) -> (i32, i32) {
    let local = [local.0, local.1];
    let mut global = [0i32; 2];
    comm.all_reduce_into(&local, &mut global, &mpi::collective::SystemOperation::bitwise_and());
    (global[0], global[1])
}

/// Confirm-or-null: sum every rank's local failure flag on the *original*
/// communicator. Non-zero means at least one rank failed, so every rank
/// must treat construction as failed.
pub fn confirm_or_null(comm: &UserCommunicator, local_failed: bool) -> bool {
    let local = if local_failed { 1i32 } else { 0i32 };
    let mut global = 0i32;
    comm.all_reduce_into(&local, &mut global, &mpi::collective::SystemOperation::sum());
    global != 0
}

pub fn barrier(comm: &UserCommunicator) {
    comm.barrier();
}
