// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy for channel operations. Construction failures are
// collective and total (every rank gets `None`, never a partial handle),
// so `channel_alloc` returns `Option<ChannelHandle>` rather than a `Result`;
// this enum covers every error surfaced once a handle exists.

use std::fmt;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors surfaced by channel operations after successful construction.
///
/// Variants map onto the five-class failure taxonomy: misuse is soft and
/// leaves the channel usable, substrate failures mark the channel broken,
/// and `BufferFatal` means the calling process should abort — no channel
/// backed by the process-wide attached buffer can be trusted afterwards.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("channel misuse: {0}")]
    Misuse(&'static str),

    #[error("local allocation failed: {0}")]
    AllocationFailed(&'static str),

    #[error("substrate failure: {0}")]
    SubstrateFailure(String),

    #[error("process-wide attached buffer entered an unrecoverable state: {0}")]
    BufferFatal(&'static str),

    #[error("operation attempted on a freed channel")]
    Freed,
}

impl ChannelError {
    /// True for errors after which the channel is no longer usable.
    pub fn is_broken(&self) -> bool {
        matches!(
            self,
            ChannelError::SubstrateFailure(_) | ChannelError::BufferFatal(_) | ChannelError::Freed
        )
    }
}

/// Wraps an `mpi` crate error surfaced mid-operation into a substrate failure.
pub(crate) fn substrate_failure(ctx: impl fmt::Display) -> ChannelError {
    ChannelError::SubstrateFailure(ctx.to_string())
}
