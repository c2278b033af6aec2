// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parsed result of a succeeded Discovery, and its child collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Address family of an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    V4,
    V6,
}

/// A single IP address bound to an interface (or, for probes that don't
/// break addresses out per-interface, directly to the snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub family: AddressFamily,
    pub prefix_len: Option<u8>,
}

/// A network interface reported by the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub mac: Option<String>,
    pub mtu: Option<u32>,
    pub state: String,
    pub speed_mbps: Option<u64>,
    pub addresses: Vec<Address>,
}

/// State of a [`Port`] as reported by `netstat`-equivalent enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortState {
    Listening,
    Established,
    CloseWait,
    TimeWait,
    Unknown,
}

impl PortState {
    pub fn from_probe_str(s: &str) -> Self {
        match s {
            "LISTENING" => PortState::Listening,
            "ESTABLISHED" => PortState::Established,
            "CLOSE_WAIT" => PortState::CloseWait,
            "TIME_WAIT" => PortState::TimeWait,
            _ => PortState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Listening => "LISTENING",
            PortState::Established => "ESTABLISHED",
            PortState::CloseWait => "CLOSE_WAIT",
            PortState::TimeWait => "TIME_WAIT",
            PortState::Unknown => "UNKNOWN",
        }
    }
}

/// A listening or connected socket.
///
/// Invariant: `state == Listening` implies `remote_ip`/`remote_port` are
/// `None`; `state == Established` implies they are `Some`. `sd-parser`
/// enforces this at parse time rather than leaving it to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub local_ip: String,
    pub local_port: u16,
    pub remote_ip: Option<String>,
    pub remote_port: Option<u16>,
    pub state: PortState,
    pub pid: Option<u32>,
    pub process_name: Option<String>,
    pub service: Option<String>,
}

/// Status of a [`Service`] as reported by the probe's service manager query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Disabled,
    Unknown,
}

impl ServiceStatus {
    pub fn from_probe_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "running" => ServiceStatus::Running,
            "stopped" => ServiceStatus::Stopped,
            "disabled" => ServiceStatus::Disabled,
            _ => ServiceStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Disabled => "disabled",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub display_name: Option<String>,
    pub status: ServiceStatus,
    pub start_mode: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    pub version: Option<String>,
    pub vendor: Option<String>,
    /// Opaque, probe-supplied string; not parsed into a date type because
    /// the two platforms emit incompatible formats.
    pub install_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filesystem {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: f64,
    pub inodes_total: Option<u64>,
    pub inodes_free: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedInUser {
    pub username: String,
    pub terminal: Option<String>,
    pub login_time: Option<String>,
    pub from_host: Option<String>,
}

/// OS family, coarsened from the probe's free-form `os_type` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsKind {
    Windows,
    Linux,
    Unknown,
}

impl OsKind {
    pub fn from_probe_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "windows" => OsKind::Windows,
            "linux" => OsKind::Linux,
            _ => OsKind::Unknown,
        }
    }
}

/// The parsed result of a successful Discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub os_name: String,
    pub os_version: String,
    pub os_kind: OsKind,
    pub kernel_version: Option<String>,
    pub cpu_model: Option<String>,
    pub cpu_count: Option<u32>,
    pub memory_total_gb: f64,
    pub disk_total_gb: f64,
    pub disk_free_gb: f64,
    pub last_boot_time: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub interfaces: Vec<Interface>,
    pub ports: Vec<Port>,
    pub services: Vec<Service>,
    pub software: Vec<Software>,
    pub filesystems: Vec<Filesystem>,
    pub users: Vec<LoggedInUser>,
}

impl Snapshot {
    /// `disk_free ≤ disk_total` and all byte/GB-valued fields are
    /// non-negative.
    pub fn satisfies_disk_invariant(&self) -> bool {
        self.disk_free_gb >= 0.0 && self.disk_total_gb >= 0.0 && self.disk_free_gb <= self.disk_total_gb
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
