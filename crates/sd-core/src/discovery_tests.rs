// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::target::TargetId;

fn new_discovery() -> Discovery {
    Discovery::start(
        DiscoveryId::new("d1"),
        TargetId::new("t1"),
        DateTime::<Utc>::UNIX_EPOCH,
        1,
    )
}

#[test]
fn fresh_discovery_is_not_terminal() {
    let d = new_discovery();
    assert!(!d.is_terminal());
}

#[test]
fn finish_succeeded_sets_status_and_artifact_path() {
    let mut d = new_discovery();
    let end = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(5);
    d.finish_succeeded(end, "/out/host-a_123".to_string());
    assert!(d.is_terminal());
    assert_eq!(d.status, Some(DiscoveryStatus::Succeeded));
    assert_eq!(d.artifact_path.as_deref(), Some("/out/host-a_123"));
    assert!(d.end.unwrap() >= d.start);
}

#[test]
fn finish_failed_records_kind_and_detail() {
    let mut d = new_discovery();
    let end = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(2);
    d.finish_failed(
        end,
        DiscoveryStatus::TimedOut,
        FailureKind::Timeout,
        "deadline exceeded".to_string(),
        Some("waited 5s".to_string()),
    );
    assert_eq!(d.status, Some(DiscoveryStatus::TimedOut));
    assert_eq!(d.error, Some(FailureKind::Timeout));
    assert_eq!(d.error_detail.as_deref(), Some("waited 5s"));
}

#[test]
fn finish_from_cache_mentions_cache_in_message() {
    let mut d = new_discovery();
    d.finish_from_cache(DateTime::<Utc>::UNIX_EPOCH, "/out/host-a_1".to_string());
    assert_eq!(d.status, Some(DiscoveryStatus::Succeeded));
    assert!(d.message.contains("cache"));
}

#[test]
fn transport_and_timeout_are_retryable_remote_and_parse_are_not() {
    assert!(FailureKind::Transport.is_retryable());
    assert!(FailureKind::Timeout.is_retryable());
    assert!(!FailureKind::Remote.is_retryable());
    assert!(!FailureKind::Parse.is_retryable());
    assert!(!FailureKind::Persist.is_retryable());
    assert!(!FailureKind::Cancel.is_retryable());
}
