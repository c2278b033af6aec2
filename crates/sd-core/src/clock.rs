// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source abstraction, so the scheduler and orchestrator tests can
//! drive wall-clock-dependent behavior (timeouts, TTLs, retry backoff)
//! deterministically.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now", for both monotonic durations and wall-clock timestamps.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, for measuring elapsed time and deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock timestamp, for persisted `start`/`end` columns.
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real clock backed by the OS.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests: `now()` is still monotonic real time (most
/// of our suspension points use `tokio::time::pause`/`advance` against it),
/// but `utc_now()` is an offset from a fixed epoch so persisted timestamps
/// are deterministic.
#[derive(Clone)]
pub struct FakeClock {
    base: Instant,
    offset_ms: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Advance the wall-clock component by `d`. Does not affect `now()`.
    pub fn advance(&self, d: Duration) {
        self.offset_ms
            .fetch_add(d.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let offset = self.offset_ms.load(Ordering::SeqCst);
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::milliseconds(offset)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
