// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sd_core::{Credential, DiscoveryId, FakeClock, IdGen, SequentialIdGen, TransportKind};
use sd_pool::FakeDialer;
use sd_transport::fake::ExecScript;
use sd_transport::{CommandOutput, FakeTransport};
use std::time::Duration as StdDuration;

fn target() -> Target {
    Target::new(
        "t1",
        "web-01",
        TransportKind::Ssh,
        22,
        Credential {
            username: "probe".to_string(),
            password: Some("hunter2".to_string()),
            key_path: None,
        },
        "us-east",
    )
}

fn config(out_dir: std::path::PathBuf) -> OrchestratorConfig {
    OrchestratorConfig {
        remote_base_dir: "/tmp".to_string(),
        out_dir,
        probe_timeout: StdDuration::from_secs(5),
        probe: ProbeSpec {
            linux_script: b"#!/bin/sh\n".to_vec(),
            windows_script: Vec::new(),
        },
    }
}

fn server_details() -> Vec<u8> {
    br#"{"hostname":"web-01","os_name":"Ubuntu","os_version":"22.04"}"#.to_vec()
}

/// Seeds a `FakeTransport` so Staging, Executing, and Fetching all succeed
/// and the canonical artifact is present.
fn seed_successful_run(transport: &FakeTransport, remote_dir: &str) {
    transport.script_exec(
        format!("ls -1 '{remote_dir}'"),
        ExecScript::Output(CommandOutput {
            exit_code: 0,
            stdout: b"server_details.json\n".to_vec(),
            stderr: Vec::new(),
        }),
    );
    transport.seed_file(format!("{remote_dir}/server_details.json"), server_details());
}

async fn harness() -> (
    ConnectionPool<FakeDialer>,
    ResultCache<FakeClock>,
    FakeClock,
    FakeDialer,
) {
    let dialer = FakeDialer::new();
    (
        ConnectionPool::new(FakeDialer::new(), 4, StdDuration::from_secs(60)),
        ResultCache::new(chrono::Duration::seconds(30), FakeClock::new()),
        FakeClock::new(),
        dialer,
    )
}

#[tokio::test]
async fn successful_run_populates_cache_and_writes_artifacts() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    let transport = FakeTransport::new();
    dialer.register(fingerprint.clone(), transport.clone());

    let remote_dir = stages::remote_staging_dir("/tmp", TransportKind::Ssh, DateTime::<Utc>::UNIX_EPOCH);
    seed_successful_run(&transport, &remote_dir);

    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (_tx, rx) = tokio::sync::watch::channel(false);
    let ids = SequentialIdGen::new("d");

    let outcome = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new(ids.next()),
        1,
        &config,
        &rx,
    )
    .await;
    let discovery = outcome.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Succeeded));
    assert!(discovery.artifact_path.is_some());
    assert!(outcome.snapshot.is_some());
    assert_eq!(cache.len(), 1);
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn dial_failure_produces_transport_failure() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    dialer.fail_next(fingerprint);
    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let outcome = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new("d1"),
        1,
        &config,
        &rx,
    )
    .await;
    let discovery = outcome.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Failed));
    assert_eq!(discovery.error, Some(FailureKind::Transport));
    assert_eq!(cache.len(), 0);
    assert!(outcome.snapshot.is_none());
}

#[tokio::test]
async fn non_zero_exit_produces_remote_failure() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    let transport = FakeTransport::new();
    dialer.register(fingerprint, transport.clone());
    let remote_dir = stages::remote_staging_dir("/tmp", TransportKind::Ssh, DateTime::<Utc>::UNIX_EPOCH);
    transport.script_exec(
        format!("cd '{remote_dir}' && ./probe.sh"),
        ExecScript::Output(CommandOutput {
            exit_code: 7,
            stdout: Vec::new(),
            stderr: b"boom".to_vec(),
        }),
    );

    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let outcome = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new("d1"),
        1,
        &config,
        &rx,
    )
    .await;
    let discovery = outcome.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Failed));
    assert_eq!(discovery.error, Some(FailureKind::Remote));
    assert!(discovery.error_detail.as_deref().unwrap_or_default().contains("boom"));
}

#[tokio::test(start_paused = true)]
async fn probe_deadline_produces_timed_out() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    let transport = FakeTransport::new();
    dialer.register(fingerprint, transport.clone());
    let remote_dir = stages::remote_staging_dir("/tmp", TransportKind::Ssh, DateTime::<Utc>::UNIX_EPOCH);
    transport.script_exec(
        format!("cd '{remote_dir}' && ./probe.sh"),
        ExecScript::Sleep(StdDuration::from_secs(60)),
    );

    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let mut config = config(out_dir.path().to_path_buf());
    config.probe_timeout = StdDuration::from_secs(1);
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let run = run_discovery(&target, &pool, &cache, &clock, DiscoveryId::new("d1"), 1, &config, &rx);
    tokio::pin!(run);
    tokio::time::advance(StdDuration::from_secs(2)).await;
    let discovery = run.await.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::TimedOut));
    assert_eq!(discovery.error, Some(FailureKind::Timeout));
}

#[tokio::test]
async fn malformed_artifact_produces_parse_failure() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    let transport = FakeTransport::new();
    dialer.register(fingerprint, transport.clone());
    let remote_dir = stages::remote_staging_dir("/tmp", TransportKind::Ssh, DateTime::<Utc>::UNIX_EPOCH);
    transport.script_exec(
        format!("ls -1 '{remote_dir}'"),
        ExecScript::Output(CommandOutput {
            exit_code: 0,
            stdout: b"server_details.json\n".to_vec(),
            stderr: Vec::new(),
        }),
    );
    transport.seed_file(format!("{remote_dir}/server_details.json"), b"{}".to_vec());

    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let outcome = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new("d1"),
        1,
        &config,
        &rx,
    )
    .await;
    let discovery = outcome.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Failed));
    assert_eq!(discovery.error, Some(FailureKind::Parse));
    assert_eq!(cache.len(), 0);
    // A parse failure is local, not a transport fault: the connection is
    // still checked back in for reuse rather than discarded.
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn cache_hit_skips_dialing_entirely() {
    let target = target();
    let fingerprint = Fingerprint::for_target(&target);
    let dialer = FakeDialer::new();
    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());

    let snapshot = sd_parser::parse_snapshot(&server_details(), clock.utc_now()).unwrap();
    match cache.acquire(&fingerprint).await {
        Acquired::Miss(guard) => guard.insert(snapshot),
        Acquired::Hit(_) => unreachable!("cache starts empty"),
    }

    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (_tx, rx) = tokio::sync::watch::channel(false);

    let outcome = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new("d1"),
        1,
        &config,
        &rx,
    )
    .await;
    let discovery = outcome.discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Succeeded));
    assert!(discovery.message.contains("cache"));
    assert!(outcome.snapshot.is_some());
    assert_eq!(pool.len(), 0);
}

#[tokio::test]
async fn cancellation_before_start_produces_cancelled_discovery() {
    let target = target();
    let dialer = FakeDialer::new();
    let pool = ConnectionPool::new(dialer, 4, StdDuration::from_secs(60));
    let clock = FakeClock::new();
    let cache = ResultCache::new(chrono::Duration::seconds(30), clock.clone());
    let out_dir = tempfile::tempdir().unwrap();
    let config = config(out_dir.path().to_path_buf());
    let (tx, rx) = tokio::sync::watch::channel(false);
    tx.send(true).unwrap();

    let discovery = run_discovery(
        &target,
        &pool,
        &cache,
        &clock,
        DiscoveryId::new("d1"),
        1,
        &config,
        &rx,
    )
    .await
    .discovery;

    assert_eq!(discovery.status, Some(DiscoveryStatus::Cancelled));
    assert_eq!(discovery.error, Some(FailureKind::Cancel));
}
