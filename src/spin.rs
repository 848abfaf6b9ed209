// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Adaptive backoff shared by every busy-wait in the crate: MCS lock
// spinning, RMA ring full/empty checks, rendezvous slot polling. There are
// no timeouts here by design — every loop runs until its condition holds.

use std::hint;
use std::thread;
use std::time::Duration;

/// Busy-spin, then pause, then yield, then sleep — in that order, advancing
/// once per call until the sleep tier is reached.
#[inline]
pub fn adaptive_yield(k: &mut u32) {
    if *k < 4 {
        // busy spin
    } else if *k < 16 {
        hint::spin_loop();
    } else if *k < 32 {
        thread::yield_now();
    } else {
        thread::sleep(Duration::from_millis(1));
        return;
    }
    *k += 1;
}

/// Loop `cond` until it returns true, calling `on_spin` between attempts.
///
/// `on_spin` is where a caller plugs in whatever local-visibility refresh
/// its substrate needs (e.g. `win.sync()` for an RMA window) before the
/// next poll. There is no bound on iterations: callers must not wrap this
/// in a timeout, per the no-spurious-timeouts rule that applies to every
/// blocking wait in this crate.
pub fn poll_until<C, S>(mut cond: C, mut on_spin: S)
where
    C: FnMut() -> bool,
    S: FnMut(),
{
    let mut k = 0u32;
    while !cond() {
        on_spin();
        adaptive_yield(&mut k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn poll_until_stops_as_soon_as_condition_holds() {
        let counter = Cell::new(0u32);
        let spins = Cell::new(0u32);
        poll_until(
            || {
                counter.set(counter.get() + 1);
                counter.get() >= 5
            },
            || spins.set(spins.get() + 1),
        );
        assert_eq!(counter.get(), 5);
        assert_eq!(spins.get(), 4);
    }

    #[test]
    fn adaptive_yield_advances_through_tiers() {
        let mut k = 0u32;
        for _ in 0..3 {
            adaptive_yield(&mut k);
        }
        assert_eq!(k, 3);
    }
}
