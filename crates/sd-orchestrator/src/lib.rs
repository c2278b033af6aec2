// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-orchestrator: drives one Target through the per-host probe state
//! machine — Dialing, Staging, Executing, Fetching, Parsing — and
//! produces a terminal [`Discovery`].

mod config;
mod stages;

pub use config::{OrchestratorConfig, ProbeSpec};

use sd_cache::{Acquired, ResultCache};
use sd_core::{
    Clock, Discovery, DiscoveryId, DiscoveryStatus, FailureKind, Fingerprint, Snapshot, Target,
};
use sd_pool::{ConnectionPool, Dialer};
use tokio::sync::watch;
use tracing::{info, warn};

/// Result of driving one Target through the state machine: the terminal
/// Discovery, plus the Snapshot when the run (fresh or cache-served) ended
/// in success. `sd-storage` persists both together so every succeeded
/// Discovery row gets exactly one Snapshot row, even on a cache hit.
pub struct DiscoveryOutcome {
    pub discovery: Discovery,
    pub snapshot: Option<Snapshot>,
}

fn cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Runs Dialing through Parsing for `target`, returning a terminal
/// [`DiscoveryOutcome`]. Never panics on remote failure; every stage's
/// errors are captured into the Discovery's `status`/`error`/`error_detail`
/// fields rather than propagated, since a failed probe is an expected
/// outcome the scheduler decides how to retry.
pub async fn run_discovery<D, C>(
    target: &Target,
    pool: &ConnectionPool<D>,
    cache: &ResultCache<C>,
    clock: &C,
    id: DiscoveryId,
    attempt: u32,
    config: &OrchestratorConfig,
    cancel: &watch::Receiver<bool>,
) -> DiscoveryOutcome
where
    D: Dialer,
    C: Clock,
{
    let fingerprint = Fingerprint::for_target(target);
    let start = clock.utc_now();
    let mut discovery = Discovery::start(id, target.id.clone(), start, attempt);

    if cancelled(cancel) {
        discovery.finish_failed(
            clock.utc_now(),
            DiscoveryStatus::Cancelled,
            FailureKind::Cancel,
            "cancelled before dialing".to_string(),
            None,
        );
        return DiscoveryOutcome { discovery, snapshot: None };
    }

    let guard = match cache.acquire(&fingerprint).await {
        Acquired::Hit(snapshot) => {
            let artifact_path = stages::local_artifact_dir(&config.out_dir, &target.hostname, start);
            discovery.finish_from_cache(clock.utc_now(), artifact_path.display().to_string());
            return DiscoveryOutcome { discovery, snapshot: Some(snapshot) };
        }
        Acquired::Miss(guard) => guard,
    };

    let mut transport = match pool.get(target).await {
        Ok(transport) => transport,
        Err(e) => {
            drop(guard);
            discovery.finish_failed(
                clock.utc_now(),
                DiscoveryStatus::Failed,
                FailureKind::Transport,
                format!("dialing failed: {e}"),
                None,
            );
            return DiscoveryOutcome { discovery, snapshot: None };
        }
    };

    if cancelled(cancel) {
        transport.close().await;
        drop(guard);
        discovery.finish_failed(
            clock.utc_now(),
            DiscoveryStatus::Cancelled,
            FailureKind::Cancel,
            "cancelled after dialing".to_string(),
            None,
        );
        return DiscoveryOutcome { discovery, snapshot: None };
    }

    let remote_dir = stages::remote_staging_dir(&config.remote_base_dir, target.transport, start);

    if let Err(e) = stages::stage(transport.as_mut(), target.transport, &remote_dir, &config.probe).await
    {
        transport.close().await;
        drop(guard);
        discovery.finish_failed(
            clock.utc_now(),
            DiscoveryStatus::Failed,
            FailureKind::Transport,
            format!("staging failed: {e}"),
            None,
        );
        return DiscoveryOutcome { discovery, snapshot: None };
    }

    if cancelled(cancel) {
        stages::best_effort_cleanup(transport.as_mut(), target.transport, &remote_dir).await;
        transport.close().await;
        drop(guard);
        discovery.finish_failed(
            clock.utc_now(),
            DiscoveryStatus::Cancelled,
            FailureKind::Cancel,
            "cancelled after staging".to_string(),
            None,
        );
        return DiscoveryOutcome { discovery, snapshot: None };
    }

    let timeout = target.timeout.unwrap_or(config.probe_timeout);
    let exec_outcome = stages::execute(transport.as_mut(), target.transport, &remote_dir, timeout).await;
    match exec_outcome {
        Ok(output) if output.success() => {}
        Ok(output) => {
            stages::best_effort_cleanup(transport.as_mut(), target.transport, &remote_dir).await;
            transport.close().await;
            drop(guard);
            discovery.finish_failed(
                clock.utc_now(),
                DiscoveryStatus::Failed,
                FailureKind::Remote,
                format!("probe exited {}", output.exit_code),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            );
            return DiscoveryOutcome { discovery, snapshot: None };
        }
        Err(e) => {
            let (status, kind) = if e.is_timeout() {
                (DiscoveryStatus::TimedOut, FailureKind::Timeout)
            } else {
                (DiscoveryStatus::Failed, FailureKind::Transport)
            };
            stages::best_effort_cleanup(transport.as_mut(), target.transport, &remote_dir).await;
            transport.close().await;
            drop(guard);
            discovery.finish_failed(clock.utc_now(), status, kind, format!("execution failed: {e}"), None);
            return DiscoveryOutcome { discovery, snapshot: None };
        }
    }

    if cancelled(cancel) {
        stages::best_effort_cleanup(transport.as_mut(), target.transport, &remote_dir).await;
        transport.close().await;
        drop(guard);
        discovery.finish_failed(
            clock.utc_now(),
            DiscoveryStatus::Cancelled,
            FailureKind::Cancel,
            "cancelled after execution".to_string(),
            None,
        );
        return DiscoveryOutcome { discovery, snapshot: None };
    }

    let local_dir = stages::local_artifact_dir(&config.out_dir, &target.hostname, start);
    let fetch_outcome =
        stages::fetch(transport.as_mut(), target.transport, &remote_dir, &local_dir).await;
    let (server_details, warnings) = match fetch_outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            stages::best_effort_cleanup(transport.as_mut(), target.transport, &remote_dir).await;
            transport.close().await;
            drop(guard);
            discovery.finish_failed(
                clock.utc_now(),
                DiscoveryStatus::Failed,
                FailureKind::Transport,
                format!("fetching artifacts failed: {e}"),
                None,
            );
            return DiscoveryOutcome { discovery, snapshot: None };
        }
    };
    for warning in &warnings {
        warn!(hostname = %target.hostname, warning = %warning, "partial artifact fetch failure");
    }

    let snapshot = match sd_parser::parse_snapshot(&server_details, clock.utc_now()) {
        Ok(snapshot) => {
            guard.insert(snapshot.clone());
            info!(hostname = %target.hostname, attempt, "discovery succeeded");
            discovery.finish_succeeded(clock.utc_now(), local_dir.display().to_string());
            Some(snapshot)
        }
        Err(e) => {
            drop(guard);
            discovery.finish_failed(
                clock.utc_now(),
                DiscoveryStatus::Failed,
                FailureKind::Parse,
                "server_details.json did not validate".to_string(),
                Some(e.diagnostic()),
            );
            None
        }
    };

    let discovery = finalize(discovery, transport, target, pool, &remote_dir).await;
    DiscoveryOutcome { discovery, snapshot }
}

async fn finalize<D: Dialer>(
    discovery: Discovery,
    mut transport: Box<dyn sd_transport::Transport>,
    target: &Target,
    pool: &ConnectionPool<D>,
    remote_dir: &str,
) -> Discovery {
    stages::best_effort_cleanup(transport.as_mut(), target.transport, remote_dir).await;
    pool.checkin(target, transport).await;
    discovery
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
