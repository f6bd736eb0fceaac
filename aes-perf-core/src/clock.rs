// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Monotonic clock readings and elapsed-time arithmetic.
//!
//! Readings come from `CLOCK_MONOTONIC`, which never goes backwards and is
//! not affected by wall-clock adjustments.

use nix::time::{clock_getres, clock_gettime, ClockId};

use crate::error::ClockError;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A single monotonic clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    secs: i64,
    nanos: i64,
}

impl Timestamp {
    /// Build a reading from its parts. `nanos` must be below one second.
    pub const fn new(secs: i64, nanos: i64) -> Self {
        Self { secs, nanos }
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn nanos(&self) -> i64 {
        self.nanos
    }
}

/// Source of monotonic timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }

    /// Read the clock.
    pub fn now(&self) -> Result<Timestamp, ClockError> {
        let ts = clock_gettime(ClockId::CLOCK_MONOTONIC).map_err(|errno| {
            ClockError::Unavailable {
                call: "clock_gettime",
                reason: errno.to_string(),
            }
        })?;
        Ok(Timestamp::new(ts.tv_sec() as i64, ts.tv_nsec() as i64))
    }

    /// Clock resolution in nanoseconds.
    pub fn resolution_ns(&self) -> Result<u64, ClockError> {
        let ts = clock_getres(ClockId::CLOCK_MONOTONIC).map_err(|errno| {
            ClockError::Unavailable {
                call: "clock_getres",
                reason: errno.to_string(),
            }
        })?;
        let ns = (ts.tv_sec() as i64) * NANOS_PER_SEC + ts.tv_nsec() as i64;
        Ok(ns.max(0) as u64)
    }

    /// Nanoseconds from `start` to `end`.
    ///
    /// Borrows a second when the nanosecond field of `end` is smaller than
    /// that of `start`. A reading that goes backwards is an error, never
    /// clamped to zero.
    pub fn elapsed_ns(start: Timestamp, end: Timestamp) -> Result<u64, ClockError> {
        let (secs, nanos) = if end.nanos < start.nanos {
            (
                end.secs - start.secs - 1,
                NANOS_PER_SEC - start.nanos + end.nanos,
            )
        } else {
            (end.secs - start.secs, end.nanos - start.nanos)
        };

        if secs < 0 {
            return Err(ClockError::NonMonotonic {
                start_secs: start.secs,
                start_nanos: start.nanos,
                end_secs: end.secs,
                end_nanos: end.nanos,
            });
        }

        let total = secs
            .checked_mul(NANOS_PER_SEC)
            .and_then(|ns| ns.checked_add(nanos))
            .ok_or(ClockError::Overflow)?;
        Ok(total as u64)
    }
}
