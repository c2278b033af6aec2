// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape of `server_details.json`, as written by the probe.
//! Field names mirror the probe contract's `snake_case` keys verbatim;
//! mapping into the normalized `sd_core::Snapshot` graph happens in
//! `normalize`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProbeDocument {
    pub hostname: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub kernel_version: Option<String>,
    #[serde(default)]
    pub cpu_model: Option<String>,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    #[serde(default)]
    pub memory_total_gb: Option<f64>,
    #[serde(default)]
    pub disk_total_gb: Option<f64>,
    #[serde(default)]
    pub disk_free_gb: Option<f64>,
    #[serde(default)]
    pub last_boot_time: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<RawIpAddress>,
    #[serde(default)]
    pub installed_software: Vec<RawSoftware>,
    #[serde(default)]
    pub running_services: Vec<RawService>,
    #[serde(default)]
    pub open_ports: Vec<RawPort>,
    #[serde(default)]
    pub mounted_filesystems: Vec<RawFilesystem>,
    /// Not part of every probe's output, but it is the only source for
    /// logged-in-user rows; accepted as an optional extension rather than
    /// rejected when absent.
    #[serde(default)]
    pub logged_in_users: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
pub struct RawIpAddress {
    pub interface: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub speed_mbps: Option<u64>,
    pub address: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub prefix_len: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct RawSoftware {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub install_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawService {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_mode: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPort {
    pub local_ip: String,
    pub local_port: u16,
    #[serde(default)]
    pub remote_ip: Option<String>,
    #[serde(default)]
    pub remote_port: Option<u16>,
    pub state: String,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFilesystem {
    pub device: String,
    pub mount_point: String,
    #[serde(default)]
    pub fs_type: Option<String>,
    #[serde(default)]
    pub total_bytes: i64,
    #[serde(default)]
    pub used_bytes: i64,
    #[serde(default)]
    pub free_bytes: i64,
    #[serde(default)]
    pub used_percent: f64,
    #[serde(default)]
    pub inodes_total: Option<i64>,
    #[serde(default)]
    pub inodes_free: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub username: String,
    #[serde(default)]
    pub terminal: Option<String>,
    #[serde(default)]
    pub login_time: Option<String>,
    #[serde(default)]
    pub from_host: Option<String>,
}
