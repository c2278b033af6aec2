// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knobs for the batch scheduler / worker pool.

use std::time::Duration;

/// Transport and Timeout failures are retried up to `max_retries` times
/// with exponential backoff; Remote and Parse failures are terminal and
/// never reach this policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 1-based attempt that just failed:
    /// `backoff_base * 2^(attempt - 1)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base * 2u32.saturating_pow(exponent)
    }
}

/// Scheduler-wide configuration: global concurrency cap and per-region
/// batch size.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Global concurrency cap K, shared across all regions.
    pub concurrency: usize,
    /// Per-region batch size B.
    pub batch_size: usize,
    pub retry: RetryPolicy,
    /// How often the progress ticker prints completed/total and CPU/mem.
    pub progress_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            batch_size: 20,
            retry: RetryPolicy::default(),
            progress_interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
