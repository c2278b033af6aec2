// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The controller façade: load config, open the database, build the
//! connection pool, result cache, and resource governor, drive one
//! discovery sweep to completion through the scheduler, persist every
//! terminal Discovery, and — on request — keep the read API serving
//! afterward.

use crate::config::Config;
use sd_cache::ResultCache;
use sd_core::{DiscoveryStatus, SystemClock, TargetId, UuidIdGen};
use sd_governor::{ResourceGovernor, Sampler, SystemSampler};
use sd_pool::{ConnectionPool, RealDialer};
use sd_storage::{persist_discovery, StorageError};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Tally of one discovery sweep, printed at the end of a `sdiscd` run.
/// Per-target failures never change the process exit code; this is
/// purely informational.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
}

impl RunSummary {
    fn record(&mut self, status: DiscoveryStatus) {
        match status {
            DiscoveryStatus::Succeeded => self.succeeded += 1,
            DiscoveryStatus::Failed => self.failed += 1,
            DiscoveryStatus::TimedOut => self.timed_out += 1,
            DiscoveryStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.timed_out + self.cancelled
    }
}

/// Opens the DB pool (if `[database].enabled`) and applies migrations. A
/// disabled database is a valid mode: discovery still runs, results are
/// just logged rather than persisted.
pub async fn open_database(config: &Config) -> Result<Option<PgPool>, StorageError> {
    if !config.database_enabled {
        return Ok(None);
    }
    let pool = sd_storage::connect_and_migrate(&config.database).await?;
    Ok(Some(pool))
}

/// Installs SIGTERM/SIGINT handlers that broadcast cancellation through a
/// `watch::channel<bool>`. The first signal flips the channel, which
/// every suspension point in the scheduler and orchestrator observes at
/// its next checkpoint and unwinds through `Failed(cancel)`. A second
/// signal is treated as an operator giving up on a graceful drain: the
/// process exits immediately instead of waiting for stragglers.
fn spawn_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        let Ok(mut term) = signal(SignalKind::terminate()) else {
            return;
        };
        let Ok(mut int) = signal(SignalKind::interrupt()) else {
            return;
        };

        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        info!("shutdown requested, cancelling new batches");
        let _ = tx.send(true);

        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
        warn!("second shutdown signal received, forcing exit");
        std::process::exit(130);
    });
    rx
}

/// Runs one discovery sweep across `config.targets` to completion:
/// schedules every target through the scheduler, persists each terminal
/// Discovery (and its Snapshot, if any), and returns a tally. The
/// scheduler's result channel closing is what "to completion" means for a
/// one-shot `sdiscd` invocation.
pub async fn run_discovery(config: &Config, db: Option<&PgPool>) -> RunSummary {
    let clock = SystemClock;
    let ids = UuidIdGen;
    let pool = ConnectionPool::new(
        RealDialer::default(),
        config.pool_capacity,
        config.pool_idle_timeout,
    );
    let cache = Arc::new(ResultCache::new(
        chrono::Duration::minutes(config.cache_ttl_minutes),
        clock,
    ));
    let sampler: Box<dyn Sampler> = Box::new(SystemSampler::new());
    let governor = Arc::new(ResourceGovernor::new(
        sampler,
        config.resource_thresholds,
        config.governor_check_interval,
    ));
    let cancel = spawn_shutdown_signal();

    let orchestrator_config = Arc::new(config.orchestrator.clone());
    let (mut results, counters) = sd_scheduler::spawn(
        config.targets.clone(),
        pool.clone(),
        Arc::clone(&cache),
        Arc::clone(&governor),
        clock,
        ids,
        orchestrator_config,
        config.scheduler,
        cancel.clone(),
    );

    let ticker = tokio::spawn(sd_scheduler::run_progress_ticker(
        Arc::clone(&counters),
        Arc::clone(&governor),
        config.scheduler.progress_interval,
        cancel.clone(),
    ));

    let targets_by_id: HashMap<TargetId, _> =
        config.targets.iter().map(|t| (t.id.clone(), t)).collect();
    let mut summary = RunSummary::default();

    while let Some(outcome) = results.recv().await {
        if let Some(status) = outcome.discovery.status {
            summary.record(status);
        }
        if let Some(db) = db {
            if let Some(target) = targets_by_id.get(&outcome.discovery.target_id) {
                if let Err(e) =
                    persist_discovery(db, target, &outcome.discovery, outcome.snapshot.as_ref()).await
                {
                    error!(target = %target.hostname, error = %e, "failed to persist discovery");
                }
            }
        }
    }

    ticker.abort();
    pool.close_all().await;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        timed_out = summary.timed_out,
        cancelled = summary.cancelled,
        "discovery run complete"
    );
    summary
}

/// Serves the read API until a termination signal arrives. Used by
/// `sdiscd --serve` after the initial sweep, so a long-lived process can
/// answer `/stats`/`/servers`/... without re-probing the fleet on every
/// request.
pub async fn serve(config: &Config, db: PgPool) -> std::io::Result<()> {
    let mut cancel = spawn_shutdown_signal();
    let shutdown = async move {
        let _ = cancel.changed().await;
    };
    sd_api::serve(db, config.api.clone(), shutdown).await
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
