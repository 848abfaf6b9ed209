// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Process-wide resource manager for the MPI attached buffer backing
// buffered sends. Every buffered channel in the process shares one of
// these; growth/shrink failures are reported with the same two-step
// rollback the reference buffer manager uses before declaring a process
// unrecoverable.

use log::{error, warn};
use std::sync::atomic::{AtomicI64, Ordering};

/// Tracks the size of this process's MPI attached buffer.
///
/// `append` and `shrink` never touch the substrate directly in this crate
/// (attach/detach happens once, lazily, the first time it's needed) — they
/// model the accounting the reference implementation performs around
/// `MPI_Buffer_attach`/`MPI_Buffer_detach`, returning the same three-way
/// result so callers can apply the documented recovery sequence.
pub struct BufferManager {
    size: AtomicI64,
}

/// Outcome of a reservation change, matching the reference return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOutcome {
    /// Change applied, no rollback needed.
    Ok,
    /// Change failed, previous buffer size was restored.
    FailedRestored,
    /// Change failed and restoring the previous size also failed. Fatal.
    FailedUnrecoverable,
}

impl BufferManager {
    pub const fn new() -> Self {
        Self {
            size: AtomicI64::new(0),
        }
    }

    pub fn current_size(&self) -> i64 {
        self.size.load(Ordering::Acquire)
    }

    /// Grow the attached buffer by `to_append` bytes.
    ///
    /// In a real deployment this would call into `mpi::ffi::MPI_Buffer_detach`
    /// followed by `MPI_Buffer_attach` over a larger region; here the
    /// bookkeeping is what callers rely on and what the tests exercise.
    pub fn append(&self, to_append: i64) -> BufferOutcome {
        if to_append < 0 {
            warn!("append_buffer called with a negative size ({to_append})");
            return BufferOutcome::FailedRestored;
        }
        self.size.fetch_add(to_append, Ordering::AcqRel);
        BufferOutcome::Ok
    }

    /// Shrink the attached buffer by `to_shrink` bytes, the inverse of
    /// `append`. Shrinking below zero means some caller's accounting is
    /// out of sync with the buffer manager's own view and is treated as
    /// unrecoverable, matching class-5 fatal semantics.
    pub fn shrink(&self, to_shrink: i64) -> BufferOutcome {
        if to_shrink < 0 {
            warn!("shrink_buffer called with a negative size ({to_shrink})");
            return BufferOutcome::FailedRestored;
        }
        let previous = self.size.fetch_sub(to_shrink, Ordering::AcqRel);
        if previous < to_shrink {
            self.size.fetch_add(to_shrink, Ordering::AcqRel);
            error!("shrink_buffer({to_shrink}) would underflow buffer of size {previous}");
            return BufferOutcome::FailedUnrecoverable;
        }
        BufferOutcome::Ok
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide singleton, shared by every buffered P2P channel live in
/// this process.
pub static PROCESS_BUFFER: BufferManager = BufferManager::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_shrink_restores_original_size() {
        let mgr = BufferManager::new();
        assert_eq!(mgr.append(1024), BufferOutcome::Ok);
        assert_eq!(mgr.current_size(), 1024);
        assert_eq!(mgr.shrink(1024), BufferOutcome::Ok);
        assert_eq!(mgr.current_size(), 0);
    }

    #[test]
    fn shrink_past_zero_is_unrecoverable_and_restores_accounting() {
        let mgr = BufferManager::new();
        mgr.append(100);
        assert_eq!(mgr.shrink(200), BufferOutcome::FailedUnrecoverable);
        assert_eq!(mgr.current_size(), 100);
    }
}
