// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-scheduler: groups Targets by region, fans them out across a bounded
//! worker pool, retries transport/timeout failures with backoff, gates new
//! batches on the resource governor, and reports progress.

mod config;
mod progress;

pub use config::{RetryPolicy, SchedulerConfig};
pub use progress::{run_progress_ticker, ProgressCounters};

use indexmap::IndexMap;
use sd_cache::ResultCache;
use sd_core::{Clock, DiscoveryId, IdGen, Target};
use sd_governor::ResourceGovernor;
use sd_orchestrator::{DiscoveryOutcome, OrchestratorConfig};
use sd_pool::{ConnectionPool, Dialer};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::debug;

/// Bounded buffer between workers and the persistence sink.
const RESULT_CHANNEL_CAPACITY: usize = 100;

/// Spawns the scheduling loop as a background task and returns the
/// channel it publishes [`DiscoveryOutcome`]s on, plus the progress
/// counters it updates. The channel closes once every region has been
/// drained or the run is cancelled.
pub fn spawn<D, C, I>(
    targets: Vec<Target>,
    pool: ConnectionPool<D>,
    cache: Arc<ResultCache<C>>,
    governor: Arc<ResourceGovernor>,
    clock: C,
    ids: I,
    orchestrator_config: Arc<OrchestratorConfig>,
    config: SchedulerConfig,
    cancel: watch::Receiver<bool>,
) -> (mpsc::Receiver<DiscoveryOutcome>, Arc<ProgressCounters>)
where
    D: Dialer,
    C: Clock,
    I: IdGen + 'static,
{
    let counters = ProgressCounters::new(targets.len() as u64);
    let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

    let loop_counters = counters.clone();
    tokio::spawn(schedule_loop(
        targets,
        pool,
        cache,
        governor,
        clock,
        ids,
        orchestrator_config,
        config,
        cancel,
        tx,
        loop_counters,
    ));

    (rx, counters)
}

async fn schedule_loop<D, C, I>(
    targets: Vec<Target>,
    pool: ConnectionPool<D>,
    cache: Arc<ResultCache<C>>,
    governor: Arc<ResourceGovernor>,
    clock: C,
    ids: I,
    orchestrator_config: Arc<OrchestratorConfig>,
    config: SchedulerConfig,
    cancel: watch::Receiver<bool>,
    tx: mpsc::Sender<DiscoveryOutcome>,
    counters: Arc<ProgressCounters>,
) where
    D: Dialer,
    C: Clock,
    I: IdGen + 'static,
{
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut regions: IndexMap<String, Vec<Target>> = IndexMap::new();
    for target in targets {
        regions.entry(target.region.clone()).or_default().push(target);
    }

    for (region, region_targets) in regions {
        if *cancel.borrow() {
            break;
        }
        for batch in region_targets.chunks(config.batch_size.max(1)) {
            if *cancel.borrow() {
                break;
            }
            debug!(region = %region, batch_len = batch.len(), "dispatching batch");
            for target in batch {
                if *cancel.borrow() {
                    break;
                }
                #[allow(clippy::expect_used)]
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed while the schedule loop holds it");
                let target = target.clone();
                let pool = pool.clone();
                let cache = Arc::clone(&cache);
                let clock = clock.clone();
                let ids = ids.clone();
                let orchestrator_config = Arc::clone(&orchestrator_config);
                let retry = config.retry;
                let cancel = cancel.clone();
                let tx = tx.clone();
                let counters = Arc::clone(&counters);

                tokio::spawn(async move {
                    let _permit = permit;
                    run_target_with_retries(
                        target,
                        &pool,
                        &cache,
                        &clock,
                        &ids,
                        &orchestrator_config,
                        retry,
                        &cancel,
                        &tx,
                    )
                    .await;
                    counters.mark_completed();
                });
            }
            governor.gate().await;
        }
    }
}

/// Drives one Target through the orchestrator, retrying Transport/Timeout
/// failures up to `retry.max_retries` times with exponential backoff.
/// Every attempt — including ones superseded by a retry — is sent
/// downstream, since each is a distinct Discovery row.
async fn run_target_with_retries<D, C, I>(
    target: Target,
    pool: &ConnectionPool<D>,
    cache: &ResultCache<C>,
    clock: &C,
    ids: &I,
    config: &OrchestratorConfig,
    retry: RetryPolicy,
    cancel: &watch::Receiver<bool>,
    tx: &mpsc::Sender<DiscoveryOutcome>,
) where
    D: Dialer,
    C: Clock,
    I: IdGen,
{
    let mut attempt: u32 = 1;
    loop {
        let id = DiscoveryId::new(ids.next());
        let outcome = sd_orchestrator::run_discovery(
            &target, pool, cache, clock, id, attempt, config, cancel,
        )
        .await;

        let retryable = outcome.discovery.error.map(|e| e.is_retryable()).unwrap_or(false);
        let should_retry = retryable && attempt <= retry.max_retries && !*cancel.borrow();

        if tx.send(outcome).await.is_err() {
            // Receiver dropped (sink shut down); nothing more to do.
            return;
        }
        if !should_retry {
            return;
        }
        tokio::time::sleep(retry.backoff_for(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
