// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic completed/total counters and a ticker that logs them alongside
//! local CPU/memory every fixed interval until every worker finishes.

use sd_governor::ResourceGovernor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared, lock-free progress counters. Cloned (via `Arc`) into every
/// worker and into the progress ticker.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    completed: AtomicU64,
    total: AtomicU64,
}

impl ProgressCounters {
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(Self {
            completed: AtomicU64::new(0),
            total: AtomicU64::new(total),
        })
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn is_done(&self) -> bool {
        self.completed() >= self.total()
    }
}

/// Periodically logs `completed/total` and the governor's last sampled
/// CPU/memory until the counters report every target finished. Runs as a
/// supervised background task, cancellable the same way as every other
/// suspension point in the scheduler.
pub async fn run_progress_ticker(
    counters: Arc<ProgressCounters>,
    governor: Arc<ResourceGovernor>,
    interval: Duration,
    mut cancel: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if counters.is_done() {
                    break;
                }
                let sample = governor.current_sample();
                info!(
                    completed = counters.completed(),
                    total = counters.total(),
                    cpu_percent = sample.cpu_percent,
                    memory_percent = sample.memory_percent,
                    "discovery progress"
                );
            }
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    break;
                }
            }
        }
        if counters.is_done() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
