// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RMA MPMC BUF: reuses the MPSC BUF producer algorithm verbatim (every
// sender still owns a private node ring and enqueues via atomic
// tail-exchange onto a single shared queue) but wraps dequeue in an MCS
// lock so multiple receivers never race on the shared head/tail. A wake
// token distinguishes "no one is waiting to be woken" from "receiver 0 is
// waiting" using the sentinel `-rank - 2`, since a plain `-1`/`0` scheme
// would collide with rank 0.

use crate::error::ChannelResult;
use crate::mcs_lock::McsLock;
use crate::node::{NodeId, NONE};
use crate::ring::RingIndices;
use crate::spin::poll_until;
use crate::substrate_ops::Window;

pub(crate) const HEAD_DISP: i64 = 0;
pub(crate) const TAIL_DISP: i64 = 8;
pub(crate) const WAKE_TOKEN_DISP: i64 = 16;
pub(crate) const NO_WAITER: i32 = i32::MIN;
/// The consumer lock's `latest`/`next`/`spin` region starts well past
/// head/tail/wake-token so the two protocols never alias on the same bytes.
pub(crate) const CONSUMER_LOCK_BASE: i64 = 1024;

fn wake_token_for(rank: i32) -> i32 {
    -rank - 2
}

fn node_next_disp(slot: i32, element_size: usize) -> i64 {
    slot as i64 * (8 + element_size as i64)
}
fn node_data_disp(slot: i32, element_size: usize) -> i64 {
    node_next_disp(slot, element_size) + 8
}

pub(crate) struct RmaMpmcBuf {
    pub sender_window: Option<Window>,
    pub shared_window: Window,
    pub is_receiver: bool,
    pub my_rank: i32,
    pub shared_owner_rank: i32,
    pub my_consumer_lock_index: i32,
    pub capacity: i32,
    pub element_size: usize,
    pub write_indices: RingIndices,
}

impl RmaMpmcBuf {
    fn consumer_lock(&self) -> McsLock<'_> {
        McsLock {
            anchor_window: &self.shared_window,
            anchor_rank: self.shared_owner_rank,
            base_disp: CONSUMER_LOCK_BASE,
            my_index: self.my_consumer_lock_index,
        }
    }

    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        let window = self.sender_window.as_ref().expect("sender window missing");
        poll_until(
            || !self.write_indices.is_full(),
            || window.sync(),
        );
        let slot = self.write_indices.write;
        window.put(data, self.my_rank, node_data_disp(slot, self.element_size))?;
        window.put(
            &NONE.to_ne_bytes(),
            self.my_rank,
            node_next_disp(slot, self.element_size),
        )?;
        window.flush(self.my_rank);
        self.write_indices.advance_write();

        let node_id = NodeId::encode(self.my_rank, slot, self.capacity);
        let previous_tail =
            self.shared_window
                .fetch_and_replace_i64(node_id, self.shared_owner_rank, TAIL_DISP)?;
        if previous_tail == NONE {
            self.shared_window
                .fetch_and_replace_i64(node_id, self.shared_owner_rank, HEAD_DISP)?;
        } else {
            let NodeId { owner_rank, slot_index } =
                NodeId::decode(previous_tail, self.capacity).expect("tail was not NONE");
            self.shared_window.put(
                &node_id.to_ne_bytes(),
                owner_rank,
                node_next_disp(slot_index, self.element_size),
            )?;
            self.shared_window.flush(owner_rank);
        }

        // Wake a waiting consumer, if the wake token addresses one.
        let mut token = [0u8; 4];
        self.shared_window
            .get(&mut token, self.shared_owner_rank, WAKE_TOKEN_DISP)?;
        let token = i32::from_ne_bytes(token);
        if token != NO_WAITER {
            let waiting_rank = -token - 2;
            self.shared_window
                .accumulate_replace_i32(1, waiting_rank, WAKE_TOKEN_DISP)?;
        }
        Ok(())
    }

    pub fn receive(&mut self, buf: &mut [u8]) -> ChannelResult<()> {
        let lock = self.consumer_lock();
        lock.acquire()?;
        self.shared_window
            .accumulate_replace_i32(wake_token_for(self.my_rank), self.shared_owner_rank, WAKE_TOKEN_DISP)?;

        let mut head = NONE;
        poll_until(
            || {
                let mut raw = [0u8; 8];
                self.shared_window.get(&mut raw, self.shared_owner_rank, HEAD_DISP).ok();
                head = i64::from_ne_bytes(raw);
                head != NONE
            },
            || self.shared_window.sync(),
        );
        self.shared_window
            .accumulate_replace_i32(NO_WAITER, self.shared_owner_rank, WAKE_TOKEN_DISP)?;

        let NodeId { owner_rank, slot_index } =
            NodeId::decode(head, self.capacity).expect("head was not NONE");
        self.shared_window
            .get(buf, owner_rank, node_data_disp(slot_index, self.element_size))?;

        let mut raw_next = [0u8; 8];
        self.shared_window
            .get(&mut raw_next, owner_rank, node_next_disp(slot_index, self.element_size))?;
        let next = i64::from_ne_bytes(raw_next);
        if next == NONE {
            let cas = self
                .shared_window
                .compare_and_swap_i64(head, NONE, self.shared_owner_rank, TAIL_DISP)?;
            if cas == head {
                self.shared_window
                    .fetch_and_replace_i64(NONE, self.shared_owner_rank, HEAD_DISP)?;
                lock.release()?;
                return Ok(());
            }
        }
        self.shared_window
            .fetch_and_replace_i64(next, self.shared_owner_rank, HEAD_DISP)?;
        lock.release()
    }

    pub fn peek(&self) -> ChannelResult<i32> {
        Ok(-1)
    }

    pub fn free(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}
