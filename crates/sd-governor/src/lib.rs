// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-governor: gates the next batch on local CPU/memory thresholds.
//!
//! Never blocks already-running workers; only gates new batch starts. A
//! coarse backpressure signal, not per-task admission control.

mod sampler;

pub use sampler::{ResourceSample, Sampler, SystemSampler};
#[cfg(any(test, feature = "test-support"))]
pub use sampler::ScriptedSampler;

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Percent thresholds above which the governor pauses between batches.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
        }
    }
}

struct Throttle {
    last_sampled_at: Option<Instant>,
    last_sample: ResourceSample,
}

pub struct ResourceGovernor {
    sampler: Mutex<Box<dyn Sampler>>,
    thresholds: Thresholds,
    check_interval: Duration,
    throttle: Mutex<Throttle>,
}

impl ResourceGovernor {
    pub fn new(sampler: Box<dyn Sampler>, thresholds: Thresholds, check_interval: Duration) -> Self {
        Self {
            sampler: Mutex::new(sampler),
            thresholds,
            check_interval,
            throttle: Mutex::new(Throttle {
                last_sampled_at: None,
                last_sample: ResourceSample {
                    cpu_percent: 0.0,
                    memory_percent: 0.0,
                },
            }),
        }
    }

    fn sample_throttled(&self) -> ResourceSample {
        let mut throttle = self.throttle.lock();
        let due = match throttle.last_sampled_at {
            None => true,
            Some(at) => at.elapsed() >= self.check_interval,
        };
        if due {
            let fresh = self.sampler.lock().sample();
            throttle.last_sample = fresh;
            throttle.last_sampled_at = Some(Instant::now());
        }
        throttle.last_sample
    }

    fn over_threshold(&self, sample: ResourceSample) -> bool {
        sample.cpu_percent > self.thresholds.cpu_percent
            || sample.memory_percent > self.thresholds.memory_percent
    }

    /// Returns the most recent sample, taking a fresh one if the check
    /// interval has elapsed. Used by the progress reporter so it doesn't
    /// need its own sampling cadence.
    pub fn current_sample(&self) -> ResourceSample {
        self.sample_throttled()
    }

    /// Blocks until local resource usage is under threshold. Called by the
    /// scheduler before dispatching each batch; never called from inside a
    /// running worker.
    pub async fn gate(&self) {
        loop {
            let sample = self.sample_throttled();
            if !self.over_threshold(sample) {
                return;
            }
            tracing::info!(
                cpu_percent = sample.cpu_percent,
                memory_percent = sample.memory_percent,
                "resource governor pausing next batch"
            );
            tokio::time::sleep(self.check_interval).await;
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
