// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

/// Message-passing substrate a channel is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Substrate {
    P2p = 0,
    Rma = 1,
}

/// Number of senders/receivers a channel admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Cardinality {
    Spsc = 0,
    Mpsc = 1,
    Mpmc = 2,
}
