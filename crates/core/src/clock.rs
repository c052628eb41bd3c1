// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! Two notions of time are needed by the supervisor: a monotonic clock for
//! durations, backoff, and deadlines (`Clock::now`), and a wall clock for the
//! unix-millisecond timestamps embedded in PID files and lock files
//! (`Clock::now_ms`). Both are provided by the same trait so a single
//! `FakeClock` can drive deterministic tests of both.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time, in both monotonic and wall-clock form.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;

    /// Current wall-clock time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Fake clock for testing with controllable time.
///
/// `advance` moves both the monotonic and wall-clock readings together so
/// tests that mix duration math and PID-file timestamps stay consistent.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

struct FakeClockState {
    monotonic: Instant,
    wall_ms: u64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                monotonic: Instant::now(),
                wall_ms: 1_700_000_000_000,
            })),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.monotonic += duration;
        state.wall_ms += duration.as_millis() as u64;
    }

    /// Set the wall-clock reading directly (monotonic side is untouched).
    pub fn set_wall_ms(&self, wall_ms: u64) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.wall_ms = wall_ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).monotonic
    }

    fn now_ms(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).wall_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
