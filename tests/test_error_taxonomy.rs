// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

// Checks that ChannelError::is_broken() draws the line where the five-class
// taxonomy says it should: misuse and local allocation failures leave a
// channel usable, substrate failures / buffer-fatal / freed do not.

#[path = "../src/error.rs"]
mod error;
use error::ChannelError;

#[test]
fn misuse_and_allocation_errors_are_not_broken() {
    assert!(!ChannelError::Misuse("wrong role").is_broken());
    assert!(!ChannelError::AllocationFailed("zeroed buffer alloc failed").is_broken());
}

#[test]
fn substrate_and_buffer_fatal_and_freed_are_broken() {
    assert!(ChannelError::SubstrateFailure("probe failed".into()).is_broken());
    assert!(ChannelError::BufferFatal("shrink past zero").is_broken());
    assert!(ChannelError::Freed.is_broken());
}

#[test]
fn display_messages_name_the_failure_class() {
    let err = ChannelError::SubstrateFailure("MPI_Recv returned non-success".into());
    assert!(err.to_string().contains("substrate failure"));

    let err = ChannelError::Freed;
    assert!(err.to_string().contains("freed"));
}
