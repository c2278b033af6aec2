// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sd_core::{AddressFamily, OsKind, PortState, ServiceStatus};

fn collected_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-07-28T12:00:00Z").unwrap().with_timezone(&Utc)
}

fn minimal_doc() -> serde_json::Value {
    serde_json::json!({
        "hostname": "web-01",
        "os_name": "Ubuntu",
        "os_version": "22.04",
    })
}

#[test]
fn minimal_document_parses_with_empty_collections() {
    let snapshot = parse_snapshot(minimal_doc().to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.os_name, "Ubuntu");
    assert_eq!(snapshot.os_version, "22.04");
    assert!(snapshot.interfaces.is_empty());
    assert!(snapshot.ports.is_empty());
    assert!(snapshot.services.is_empty());
    assert!(snapshot.software.is_empty());
    assert!(snapshot.filesystems.is_empty());
    assert!(snapshot.users.is_empty());
}

#[yare::parameterized(
    missing_hostname = { "hostname" },
    missing_os_name = { "os_name" },
    missing_os_version = { "os_version" },
)]
fn absent_required_field_is_rejected(field: &str) {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().remove(field);
    let err = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap_err();
    assert!(matches!(err, ParseError::MissingField(f) if f == field));
}

#[test]
fn malformed_json_is_reported() {
    let err = parse_snapshot(b"{not json", collected_at()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedJson(_)));
}

#[yare::parameterized(
    negative_memory = { "memory_total_gb" },
    negative_disk_total = { "disk_total_gb" },
    negative_disk_free = { "disk_free_gb" },
)]
fn negative_gb_values_are_rejected(field: &str) {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(field.to_string(), serde_json::json!(-1.0));
    let err = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { field: f, .. } if f == field));
}

#[test]
fn disk_free_exceeding_disk_total_is_rejected() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert("disk_total_gb".to_string(), serde_json::json!(10.0));
    doc.as_object_mut().unwrap().insert("disk_free_gb".to_string(), serde_json::json!(20.0));
    let err = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { field: "disk_free_gb", .. }));
}

#[test]
fn unrecognized_os_type_maps_to_unknown() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert("os_type".to_string(), serde_json::json!("plan9"));
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.os_kind, OsKind::Unknown);
}

#[test]
fn ip_address_rows_group_by_interface_name_preserving_first_seen_order() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "ip_addresses".to_string(),
        serde_json::json!([
            { "interface": "eth1", "address": "10.0.0.2", "family": "ipv4" },
            { "interface": "eth0", "address": "10.0.0.1", "family": "ipv4" },
            { "interface": "eth0", "address": "fe80::1", "family": "ipv6" },
        ]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.interfaces.len(), 2);
    assert_eq!(snapshot.interfaces[0].name, "eth1");
    assert_eq!(snapshot.interfaces[1].name, "eth0");
    assert_eq!(snapshot.interfaces[1].addresses.len(), 2);
    assert_eq!(snapshot.interfaces[1].addresses[1].family, AddressFamily::V6);
}

#[test]
fn listening_port_with_remote_fields_has_them_dropped() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "open_ports".to_string(),
        serde_json::json!([{
            "local_ip": "0.0.0.0",
            "local_port": 443,
            "remote_ip": "1.2.3.4",
            "remote_port": 9999,
            "state": "LISTENING",
        }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    let port = &snapshot.ports[0];
    assert_eq!(port.state, PortState::Listening);
    assert!(port.remote_ip.is_none());
    assert!(port.remote_port.is_none());
}

#[test]
fn established_port_missing_remote_fields_coerces_to_unknown() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "open_ports".to_string(),
        serde_json::json!([{
            "local_ip": "10.0.0.1",
            "local_port": 54321,
            "state": "ESTABLISHED",
        }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    let port = &snapshot.ports[0];
    assert_eq!(port.state, PortState::Unknown);
    assert!(port.remote_ip.is_none());
    assert!(port.remote_port.is_none());
}

#[test]
fn established_port_with_both_remote_fields_keeps_state() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "open_ports".to_string(),
        serde_json::json!([{
            "local_ip": "10.0.0.1",
            "local_port": 54321,
            "remote_ip": "10.0.0.2",
            "remote_port": 443,
            "state": "ESTABLISHED",
        }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    let port = &snapshot.ports[0];
    assert_eq!(port.state, PortState::Established);
    assert_eq!(port.remote_ip.as_deref(), Some("10.0.0.2"));
}

#[test]
fn unrecognized_service_status_maps_to_unknown() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "running_services".to_string(),
        serde_json::json!([{ "name": "sshd", "status": "paused" }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.services[0].status, ServiceStatus::Unknown);
}

#[test]
fn negative_filesystem_byte_counters_are_rejected() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "mounted_filesystems".to_string(),
        serde_json::json!([{
            "device": "/dev/sda1",
            "mount_point": "/",
            "total_bytes": -1,
        }]),
    );
    let err = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { field: "total_bytes", .. }));
}

#[test]
fn filesystem_missing_fs_type_defaults_to_unknown() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "mounted_filesystems".to_string(),
        serde_json::json!([{
            "device": "/dev/sda1",
            "mount_point": "/",
        }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.filesystems[0].fs_type, "unknown");
}

#[test]
fn logged_in_users_extension_field_is_accepted() {
    let mut doc = minimal_doc();
    doc.as_object_mut().unwrap().insert(
        "logged_in_users".to_string(),
        serde_json::json!([{ "username": "alice", "terminal": "pts/0" }]),
    );
    let snapshot = parse_snapshot(doc.to_string().as_bytes(), collected_at()).unwrap();
    assert_eq!(snapshot.users[0].username, "alice");
}
