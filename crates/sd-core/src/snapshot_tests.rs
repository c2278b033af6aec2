// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn base_snapshot() -> Snapshot {
    Snapshot {
        os_name: "Ubuntu".to_string(),
        os_version: "22.04".to_string(),
        os_kind: OsKind::Linux,
        kernel_version: Some("5.15.0".to_string()),
        cpu_model: Some("Xeon".to_string()),
        cpu_count: Some(8),
        memory_total_gb: 32.0,
        disk_total_gb: 500.0,
        disk_free_gb: 200.0,
        last_boot_time: None,
        collected_at: Utc::now(),
        interfaces: vec![],
        ports: vec![],
        services: vec![],
        software: vec![],
        filesystems: vec![],
        users: vec![],
    }
}

#[test]
fn disk_free_less_than_total_satisfies_invariant() {
    assert!(base_snapshot().satisfies_disk_invariant());
}

#[test]
fn disk_free_greater_than_total_violates_invariant() {
    let mut s = base_snapshot();
    s.disk_free_gb = 600.0;
    assert!(!s.satisfies_disk_invariant());
}

#[test]
fn port_state_parses_known_values() {
    assert_eq!(PortState::from_probe_str("LISTENING"), PortState::Listening);
    assert_eq!(
        PortState::from_probe_str("ESTABLISHED"),
        PortState::Established
    );
}

#[test]
fn port_state_maps_unknown_values_to_unknown_bucket() {
    assert_eq!(PortState::from_probe_str("SYN_SENT"), PortState::Unknown);
}

#[test]
fn service_status_is_case_insensitive() {
    assert_eq!(ServiceStatus::from_probe_str("Running"), ServiceStatus::Running);
    assert_eq!(ServiceStatus::from_probe_str("bogus"), ServiceStatus::Unknown);
}

#[test]
fn os_kind_unknown_for_unrecognized_platform() {
    assert_eq!(OsKind::from_probe_str("plan9"), OsKind::Unknown);
}
