// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional writes into the relational schema. One transaction per
//! Discovery: upsert the Target, insert the Discovery row, and — only on
//! success — the Snapshot header plus every child collection, keyed by
//! `discovery_id` so reruns never collide with prior rows.

use crate::error::StorageError;
use sd_core::{Discovery, Snapshot, Target};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// Persists one Discovery (and its Snapshot, if any) in a single
/// transaction. Rolls back and returns an error on any failure; the caller
/// is responsible for marking the in-memory Discovery `failed(persist)`
/// without that affecting any other worker.
pub async fn persist_discovery(
    pool: &PgPool,
    target: &Target,
    discovery: &Discovery,
    snapshot: Option<&Snapshot>,
) -> Result<(), StorageError> {
    let mut txn = pool.begin().await?;

    upsert_target(&mut txn, target, discovery).await?;
    insert_discovery(&mut txn, target, discovery).await?;

    if discovery.status.map(|s| s.is_succeeded()).unwrap_or(false) {
        if let Some(snapshot) = snapshot {
            insert_snapshot(&mut txn, &discovery.id, &target.id, snapshot).await?;
        }
    }

    upsert_target_tags(&mut txn, target).await?;

    txn.commit().await?;
    debug!(target = %target.hostname, discovery_id = %discovery.id, "persisted discovery");
    Ok(())
}

async fn upsert_target(
    txn: &mut Transaction<'_, Postgres>,
    target: &Target,
    discovery: &Discovery,
) -> Result<(), StorageError> {
    let last_checked = discovery.end.unwrap_or(discovery.start);
    sqlx::query(
        r#"
        INSERT INTO targets (id, hostname, transport_kind, port, region, username, use_https, skip_cert_verify, created_at, last_checked)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (hostname) DO UPDATE SET
            region = EXCLUDED.region,
            transport_kind = EXCLUDED.transport_kind,
            port = EXCLUDED.port,
            use_https = EXCLUDED.use_https,
            skip_cert_verify = EXCLUDED.skip_cert_verify,
            last_checked = EXCLUDED.last_checked
        "#,
    )
    .bind(target.id.as_str())
    .bind(&target.hostname)
    .bind(target.transport.as_str())
    .bind(target.port as i32)
    .bind(&target.region)
    .bind(&target.credential.username)
    .bind(target.use_https)
    .bind(target.skip_cert_verify)
    .bind(target.created_at)
    .bind(last_checked)
    .execute(&mut **txn)
    .await?;
    Ok(())
}

async fn insert_discovery(
    txn: &mut Transaction<'_, Postgres>,
    target: &Target,
    discovery: &Discovery,
) -> Result<(), StorageError> {
    let end = discovery.end.unwrap_or(discovery.start);
    sqlx::query(
        r#"
        INSERT INTO discoveries (id, target_id, attempt, start_time, end_time, status, message, error_kind, error_detail, artifact_path)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(discovery.id.as_str())
    .bind(target.id.as_str())
    .bind(discovery.attempt as i32)
    .bind(discovery.start)
    .bind(end)
    .bind(discovery.status.map(|s| s.as_str()).unwrap_or("unknown"))
    .bind(&discovery.message)
    .bind(discovery.error.map(|e| e.as_str()))
    .bind(&discovery.error_detail)
    .bind(&discovery.artifact_path)
    .execute(&mut **txn)
    .await?;
    Ok(())
}

async fn insert_snapshot(
    txn: &mut Transaction<'_, Postgres>,
    discovery_id: &sd_core::DiscoveryId,
    target_id: &sd_core::TargetId,
    snapshot: &Snapshot,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO snapshots (discovery_id, target_id, os_name, os_version, os_kind, kernel_version, cpu_model, cpu_count, memory_total_gb, disk_total_gb, disk_free_gb, last_boot_time, collected_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(discovery_id.as_str())
    .bind(target_id.as_str())
    .bind(&snapshot.os_name)
    .bind(&snapshot.os_version)
    .bind(os_kind_str(snapshot.os_kind))
    .bind(&snapshot.kernel_version)
    .bind(&snapshot.cpu_model)
    .bind(snapshot.cpu_count.map(|v| v as i32))
    .bind(snapshot.memory_total_gb)
    .bind(snapshot.disk_total_gb)
    .bind(snapshot.disk_free_gb)
    .bind(snapshot.last_boot_time)
    .bind(snapshot.collected_at)
    .execute(&mut **txn)
    .await?;

    for iface in &snapshot.interfaces {
        let interface_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO interfaces (discovery_id, name, mac, mtu, state, speed_mbps)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&iface.name)
        .bind(&iface.mac)
        .bind(iface.mtu.map(|v| v as i32))
        .bind(&iface.state)
        .bind(iface.speed_mbps.map(|v| v as i64))
        .fetch_one(&mut **txn)
        .await?;

        for addr in &iface.addresses {
            sqlx::query(
                r#"
                INSERT INTO addresses (discovery_id, interface_id, address, family, prefix_len)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(discovery_id.as_str())
            .bind(interface_id)
            .bind(&addr.address)
            .bind(address_family_str(addr.family))
            .bind(addr.prefix_len.map(|v| v as i16))
            .execute(&mut **txn)
            .await?;
        }
    }

    for port in &snapshot.ports {
        sqlx::query(
            r#"
            INSERT INTO ports (discovery_id, local_ip, local_port, remote_ip, remote_port, state, pid, process_name, service)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&port.local_ip)
        .bind(port.local_port as i32)
        .bind(&port.remote_ip)
        .bind(port.remote_port.map(|v| v as i32))
        .bind(port.state.as_str())
        .bind(port.pid.map(|v| v as i32))
        .bind(&port.process_name)
        .bind(&port.service)
        .execute(&mut **txn)
        .await?;
    }

    for service in &snapshot.services {
        sqlx::query(
            r#"
            INSERT INTO services (discovery_id, name, display_name, status, start_mode, account)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&service.name)
        .bind(&service.display_name)
        .bind(service.status.as_str())
        .bind(&service.start_mode)
        .bind(&service.account)
        .execute(&mut **txn)
        .await?;
    }

    for software in &snapshot.software {
        sqlx::query(
            r#"
            INSERT INTO software (discovery_id, name, version, vendor, install_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&software.name)
        .bind(&software.version)
        .bind(&software.vendor)
        .bind(&software.install_date)
        .execute(&mut **txn)
        .await?;
    }

    for fs in &snapshot.filesystems {
        sqlx::query(
            r#"
            INSERT INTO filesystems (discovery_id, device, mount_point, fs_type, total_bytes, used_bytes, free_bytes, used_percent, inodes_total, inodes_free)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&fs.device)
        .bind(&fs.mount_point)
        .bind(&fs.fs_type)
        .bind(fs.total_bytes as i64)
        .bind(fs.used_bytes as i64)
        .bind(fs.free_bytes as i64)
        .bind(fs.used_percent)
        .bind(fs.inodes_total.map(|v| v as i64))
        .bind(fs.inodes_free.map(|v| v as i64))
        .execute(&mut **txn)
        .await?;
    }

    for user in &snapshot.users {
        sqlx::query(
            r#"
            INSERT INTO users (discovery_id, username, terminal, login_time, from_host)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(discovery_id.as_str())
        .bind(&user.username)
        .bind(&user.terminal)
        .bind(&user.login_time)
        .bind(&user.from_host)
        .execute(&mut **txn)
        .await?;
    }

    Ok(())
}

async fn upsert_target_tags(
    txn: &mut Transaction<'_, Postgres>,
    target: &Target,
) -> Result<(), StorageError> {
    for (key, value) in &target.tags {
        sqlx::query(
            r#"
            INSERT INTO target_tags (target_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (target_id, key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(target.id.as_str())
        .bind(key)
        .bind(value)
        .execute(&mut **txn)
        .await?;
    }
    Ok(())
}

fn os_kind_str(kind: sd_core::OsKind) -> &'static str {
    match kind {
        sd_core::OsKind::Windows => "windows",
        sd_core::OsKind::Linux => "linux",
        sd_core::OsKind::Unknown => "unknown",
    }
}

fn address_family_str(family: sd_core::AddressFamily) -> &'static str {
    match family {
        sd_core::AddressFamily::V4 => "v4",
        sd_core::AddressFamily::V6 => "v6",
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
