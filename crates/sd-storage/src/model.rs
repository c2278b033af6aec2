// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-model shapes returned by `queries`, serialized directly by
//! `sd-api`'s handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TargetSummary {
    pub id: String,
    pub hostname: String,
    pub transport_kind: String,
    pub port: i32,
    pub region: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub discovery_count: i64,
    pub last_discovery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TargetRow {
    pub id: String,
    pub hostname: String,
    pub transport_kind: String,
    pub port: i32,
    pub region: String,
    pub username: String,
    pub use_https: bool,
    pub skip_cert_verify: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DiscoverySummary {
    pub id: String,
    pub target_id: String,
    pub attempt: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub message: String,
    pub error_kind: Option<String>,
    pub error_detail: Option<String>,
    pub artifact_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InterfaceRow {
    pub id: i64,
    pub name: String,
    pub mac: Option<String>,
    pub mtu: Option<i32>,
    pub state: String,
    pub speed_mbps: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AddressRow {
    pub interface_id: i64,
    pub address: String,
    pub family: String,
    pub prefix_len: Option<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDetail {
    pub name: String,
    pub mac: Option<String>,
    pub mtu: Option<i32>,
    pub state: String,
    pub speed_mbps: Option<i64>,
    pub addresses: Vec<AddressRow>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PortRow {
    pub local_ip: String,
    pub local_port: i32,
    pub remote_ip: Option<String>,
    pub remote_port: Option<i32>,
    pub state: String,
    pub pid: Option<i32>,
    pub process_name: Option<String>,
    pub service: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceRow {
    pub name: String,
    pub display_name: Option<String>,
    pub status: String,
    pub start_mode: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SoftwareRow {
    pub name: String,
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub install_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FilesystemRow {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: i64,
    pub used_bytes: i64,
    pub free_bytes: i64,
    pub used_percent: f64,
    pub inodes_total: Option<i64>,
    pub inodes_free: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub username: String,
    pub terminal: Option<String>,
    pub login_time: Option<String>,
    pub from_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SnapshotHeader {
    pub os_name: String,
    pub os_version: String,
    pub os_kind: String,
    pub kernel_version: Option<String>,
    pub cpu_model: Option<String>,
    pub cpu_count: Option<i32>,
    pub memory_total_gb: f64,
    pub disk_total_gb: f64,
    pub disk_free_gb: f64,
    pub last_boot_time: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDetail {
    #[serde(flatten)]
    pub header: SnapshotHeader,
    pub interfaces: Vec<InterfaceDetail>,
    pub ports: Vec<PortRow>,
    pub services: Vec<ServiceRow>,
    pub software: Vec<SoftwareRow>,
    pub filesystems: Vec<FilesystemRow>,
    pub users: Vec<UserRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetDetail {
    pub target: TargetRow,
    pub tags: HashMap<String, String>,
    pub snapshot: Option<SnapshotDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryDetail {
    pub discovery: DiscoverySummary,
    pub snapshot: Option<SnapshotDetail>,
}

/// Aggregate fleet stats backing `GET /stats`.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub server_count: i64,
    pub discovery_count: i64,
    /// `succeeded / total * 100`, or `0.0` when `total == 0`.
    pub success_rate: f64,
    pub region_distribution: HashMap<String, i64>,
}
