// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the probe's wire shape onto the normalized entity graph, enforcing
//! its field-validation rules.

use crate::error::ParseError;
use crate::raw::{ProbeDocument, RawFilesystem, RawPort, RawService, RawSoftware, RawUser};
use chrono::{DateTime, Utc};
use sd_core::{
    Address, AddressFamily, Filesystem, Interface, LoggedInUser, OsKind, Port, PortState, Service,
    ServiceStatus, Snapshot, Software,
};
use std::collections::BTreeMap;

pub fn normalize(doc: ProbeDocument, collected_at: DateTime<Utc>) -> Result<Snapshot, ParseError> {
    let os_name = doc.os_name.ok_or(ParseError::MissingField("os_name"))?;
    let os_version = doc.os_version.ok_or(ParseError::MissingField("os_version"))?;
    doc.hostname.as_deref().ok_or(ParseError::MissingField("hostname"))?;

    let memory_total_gb = non_negative("memory_total_gb", doc.memory_total_gb.unwrap_or(0.0))?;
    let disk_total_gb = non_negative("disk_total_gb", doc.disk_total_gb.unwrap_or(0.0))?;
    let disk_free_gb = non_negative("disk_free_gb", doc.disk_free_gb.unwrap_or(0.0))?;
    if disk_free_gb > disk_total_gb {
        return Err(ParseError::InvalidValue {
            field: "disk_free_gb",
            detail: format!("{disk_free_gb} exceeds disk_total_gb {disk_total_gb}"),
        });
    }

    Ok(Snapshot {
        os_kind: doc
            .os_type
            .as_deref()
            .map(OsKind::from_probe_str)
            .unwrap_or(OsKind::Unknown),
        os_name,
        os_version,
        kernel_version: doc.kernel_version,
        cpu_model: doc.cpu_model,
        cpu_count: doc.cpu_count,
        memory_total_gb,
        disk_total_gb,
        disk_free_gb,
        last_boot_time: doc
            .last_boot_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        collected_at,
        interfaces: group_interfaces(doc.ip_addresses),
        ports: doc
            .open_ports
            .into_iter()
            .map(normalize_port)
            .collect::<Result<Vec<_>, _>>()?,
        services: doc.running_services.into_iter().map(normalize_service).collect(),
        software: doc.installed_software.into_iter().map(normalize_software).collect(),
        filesystems: doc
            .mounted_filesystems
            .into_iter()
            .map(normalize_filesystem)
            .collect::<Result<Vec<_>, _>>()?,
        users: doc.logged_in_users.into_iter().map(normalize_user).collect(),
    })
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ParseError> {
    if value < 0.0 {
        Err(ParseError::InvalidValue {
            field,
            detail: format!("{value} is negative"),
        })
    } else {
        Ok(value)
    }
}

/// The probe emits one row per (interface, address) pair; group rows that
/// share an interface name into a single `Interface` with multiple
/// `Address` entries rather than flattening addresses onto the snapshot.
fn group_interfaces(rows: Vec<crate::raw::RawIpAddress>) -> Vec<Interface> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, Interface> = BTreeMap::new();

    for row in rows {
        let entry = grouped.entry(row.interface.clone()).or_insert_with(|| {
            order.push(row.interface.clone());
            Interface {
                name: row.interface.clone(),
                mac: None,
                mtu: None,
                state: String::new(),
                speed_mbps: None,
                addresses: Vec::new(),
            }
        });
        entry.mac = entry.mac.clone().or(row.mac);
        entry.mtu = entry.mtu.or(row.mtu);
        if entry.state.is_empty() {
            entry.state = row.state.clone().unwrap_or_default();
        }
        entry.speed_mbps = entry.speed_mbps.or(row.speed_mbps);
        entry.addresses.push(Address {
            address: row.address,
            family: row
                .family
                .as_deref()
                .map(|f| match f.to_ascii_lowercase().as_str() {
                    "v6" | "ipv6" => AddressFamily::V6,
                    _ => AddressFamily::V4,
                })
                .unwrap_or(AddressFamily::V4),
            prefix_len: row.prefix_len,
        });
    }

    order
        .into_iter()
        .filter_map(|name| grouped.remove(&name))
        .collect()
}

fn normalize_port(row: RawPort) -> Result<Port, ParseError> {
    let mut state = PortState::from_probe_str(&row.state);
    let (mut remote_ip, mut remote_port) = (row.remote_ip, row.remote_port);

    match state {
        PortState::Listening => {
            // A LISTENING port's remote fields are dropped even if the
            // probe supplied them.
            remote_ip = None;
            remote_port = None;
        }
        PortState::Established => {
            if remote_ip.is_none() || remote_port.is_none() {
                state = PortState::Unknown;
                remote_ip = None;
                remote_port = None;
            }
        }
        _ => {}
    }

    Ok(Port {
        local_ip: row.local_ip,
        local_port: row.local_port,
        remote_ip,
        remote_port,
        state,
        pid: row.pid,
        process_name: row.process_name,
        service: row.service,
    })
}

fn normalize_service(row: RawService) -> Service {
    Service {
        name: row.name,
        display_name: row.display_name,
        status: row
            .status
            .as_deref()
            .map(ServiceStatus::from_probe_str)
            .unwrap_or(ServiceStatus::Unknown),
        start_mode: row.start_mode,
        account: row.account,
    }
}

fn normalize_software(row: RawSoftware) -> Software {
    Software {
        name: row.name,
        version: row.version,
        vendor: row.vendor,
        install_date: row.install_date,
    }
}

fn normalize_filesystem(row: RawFilesystem) -> Result<Filesystem, ParseError> {
    let total_bytes = non_negative_i64("total_bytes", row.total_bytes)?;
    let used_bytes = non_negative_i64("used_bytes", row.used_bytes)?;
    let free_bytes = non_negative_i64("free_bytes", row.free_bytes)?;

    Ok(Filesystem {
        device: row.device,
        mount_point: row.mount_point,
        fs_type: row.fs_type.unwrap_or_else(|| "unknown".to_string()),
        total_bytes,
        used_bytes,
        free_bytes,
        used_percent: row.used_percent,
        inodes_total: row.inodes_total.map(|v| v.max(0) as u64),
        inodes_free: row.inodes_free.map(|v| v.max(0) as u64),
    })
}

fn non_negative_i64(field: &'static str, value: i64) -> Result<u64, ParseError> {
    if value < 0 {
        Err(ParseError::InvalidValue {
            field,
            detail: format!("{value} is negative"),
        })
    } else {
        Ok(value as u64)
    }
}

fn normalize_user(row: RawUser) -> LoggedInUser {
    LoggedInUser {
        username: row.username,
        terminal: row.terminal,
        login_time: row.login_time,
        from_host: row.from_host,
    }
}
