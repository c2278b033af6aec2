// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sd_core::{FakeClock, OsKind};

fn snapshot() -> Snapshot {
    Snapshot {
        os_name: "Ubuntu".to_string(),
        os_version: "22.04".to_string(),
        os_kind: OsKind::Linux,
        kernel_version: None,
        cpu_model: None,
        cpu_count: None,
        memory_total_gb: 16.0,
        disk_total_gb: 100.0,
        disk_free_gb: 40.0,
        last_boot_time: None,
        collected_at: chrono::Utc::now(),
        interfaces: Vec::new(),
        ports: Vec::new(),
        services: Vec::new(),
        software: Vec::new(),
        filesystems: Vec::new(),
        users: Vec::new(),
    }
}

fn fp(host: &str) -> Fingerprint {
    Fingerprint::new(host, 22, sd_core::TransportKind::Ssh)
}

#[tokio::test]
async fn miss_then_insert_produces_a_fresh_hit() {
    let clock = FakeClock::new();
    let cache = ResultCache::new(ChronoDuration::minutes(30), clock);
    let key = fp("host-a");

    match cache.acquire(&key).await {
        Acquired::Miss(guard) => guard.insert(snapshot()),
        Acquired::Hit(_) => panic!("expected a miss on an empty cache"),
    }

    match cache.acquire(&key).await {
        Acquired::Hit(s) => assert_eq!(s.os_name, "Ubuntu"),
        Acquired::Miss(_) => panic!("expected a hit after insert"),
    }
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn entry_expires_after_ttl() {
    let clock = FakeClock::new();
    let cache = ResultCache::new(ChronoDuration::minutes(30), clock.clone());
    let key = fp("host-a");

    match cache.acquire(&key).await {
        Acquired::Miss(guard) => guard.insert(snapshot()),
        Acquired::Hit(_) => panic!("expected a miss on an empty cache"),
    }

    clock.advance(std::time::Duration::from_secs(31 * 60));

    match cache.acquire(&key).await {
        Acquired::Miss(_) => {}
        Acquired::Hit(_) => panic!("entry should have expired"),
    }
}

#[tokio::test]
async fn dropping_a_guard_without_inserting_allows_retry() {
    let clock = FakeClock::new();
    let cache = ResultCache::new(ChronoDuration::minutes(30), clock);
    let key = fp("host-a");

    match cache.acquire(&key).await {
        Acquired::Miss(guard) => drop(guard),
        Acquired::Hit(_) => panic!("expected a miss"),
    }

    match cache.acquire(&key).await {
        Acquired::Miss(_) => {}
        Acquired::Hit(_) => panic!("nothing was ever inserted"),
    }
}

#[tokio::test]
async fn concurrent_acquire_serializes_through_the_gate() {
    let clock = FakeClock::new();
    let cache = Arc::new(ResultCache::new(ChronoDuration::minutes(30), clock));
    let key = fp("host-a");

    let (release_tx, release_rx) = tokio::sync::oneshot::channel();
    let (holding_tx, holding_rx) = tokio::sync::oneshot::channel();

    let first = {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move {
            match cache.acquire(&key).await {
                Acquired::Miss(guard) => {
                    holding_tx.send(()).unwrap();
                    release_rx.await.unwrap();
                    guard.insert(snapshot());
                }
                Acquired::Hit(_) => panic!("expected the first caller to miss"),
            }
        })
    };

    holding_rx.await.unwrap();

    let second = {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move { cache.acquire(&key).await.into_hit_or_panic() })
    };

    // Give the second task a chance to block on the gate before releasing.
    tokio::task::yield_now().await;
    release_tx.send(()).unwrap();
    first.await.unwrap();

    let snapshot = second.await.unwrap();
    assert_eq!(snapshot.os_name, "Ubuntu");
}

impl<'a, C: Clock> Acquired<'a, C> {
    fn into_hit_or_panic(self) -> Snapshot {
        match self {
            Acquired::Hit(s) => s,
            Acquired::Miss(_) => panic!("second caller should have waited for a hit"),
        }
    }
}
