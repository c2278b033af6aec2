// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn run_summary_tallies_every_terminal_status() {
    let mut summary = RunSummary::default();
    summary.record(DiscoveryStatus::Succeeded);
    summary.record(DiscoveryStatus::Succeeded);
    summary.record(DiscoveryStatus::Failed);
    summary.record(DiscoveryStatus::TimedOut);
    summary.record(DiscoveryStatus::Cancelled);

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.total(), 5);
}

#[test]
fn run_summary_starts_empty() {
    let summary = RunSummary::default();
    assert_eq!(summary.total(), 0);
}
