// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-model queries backing `sd-api`'s handlers. Every query here is a
//! fixed, known-shape SQL statement; ad-hoc queries go through
//! `query_guard` instead.

use crate::error::StorageError;
use crate::model::{
    AddressRow, DiscoveryDetail, DiscoverySummary, FilesystemRow, InterfaceDetail, InterfaceRow,
    PortRow, ServiceRow, SnapshotDetail, SnapshotHeader, SoftwareRow, Stats, TargetDetail,
    TargetRow, TargetSummary, UserRow,
};
use sqlx::PgPool;
use std::collections::HashMap;

/// Lists every target with its discovery count and most recent attempt.
pub async fn list_targets(pool: &PgPool) -> Result<Vec<TargetSummary>, StorageError> {
    let rows = sqlx::query_as::<_, TargetSummary>(
        r#"
        SELECT
            t.id,
            t.hostname,
            t.transport_kind,
            t.port,
            t.region,
            t.last_checked,
            COUNT(d.id) AS discovery_count,
            MAX(d.end_time) AS last_discovery
        FROM targets t
        LEFT JOIN discoveries d ON d.target_id = t.id
        GROUP BY t.id
        ORDER BY t.hostname
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Full detail for one target: its row, its tags, and the snapshot from
/// its most recent succeeded discovery (if any).
pub async fn target_detail(pool: &PgPool, target_id: &str) -> Result<Option<TargetDetail>, StorageError> {
    let target = sqlx::query_as::<_, TargetRow>(
        r#"
        SELECT id, hostname, transport_kind, port, region, username, use_https, skip_cert_verify, created_at, last_checked
        FROM targets
        WHERE id = $1
        "#,
    )
    .bind(target_id)
    .fetch_optional(pool)
    .await?;

    let Some(target) = target else {
        return Ok(None);
    };

    let tag_rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT key, value FROM target_tags WHERE target_id = $1",
    )
    .bind(target_id)
    .fetch_all(pool)
    .await?;
    let tags: HashMap<String, String> = tag_rows.into_iter().collect();

    let latest_discovery_id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM discoveries
        WHERE target_id = $1 AND status = 'succeeded'
        ORDER BY end_time DESC
        LIMIT 1
        "#,
    )
    .bind(target_id)
    .fetch_optional(pool)
    .await?;

    let snapshot = match latest_discovery_id {
        Some(discovery_id) => load_snapshot_detail(pool, &discovery_id).await?,
        None => None,
    };

    Ok(Some(TargetDetail {
        target,
        tags,
        snapshot,
    }))
}

/// Discovery history for one target, newest first.
pub async fn discovery_history(
    pool: &PgPool,
    target_id: &str,
) -> Result<Vec<DiscoverySummary>, StorageError> {
    let rows = sqlx::query_as::<_, DiscoverySummary>(
        r#"
        SELECT id, target_id, attempt, start_time, end_time, status, message, error_kind, error_detail, artifact_path
        FROM discoveries
        WHERE target_id = $1
        ORDER BY end_time DESC
        "#,
    )
    .bind(target_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One discovery's full detail, including its snapshot if it succeeded.
pub async fn discovery_detail(
    pool: &PgPool,
    discovery_id: &str,
) -> Result<Option<DiscoveryDetail>, StorageError> {
    let discovery = sqlx::query_as::<_, DiscoverySummary>(
        r#"
        SELECT id, target_id, attempt, start_time, end_time, status, message, error_kind, error_detail, artifact_path
        FROM discoveries
        WHERE id = $1
        "#,
    )
    .bind(discovery_id)
    .fetch_optional(pool)
    .await?;

    let Some(discovery) = discovery else {
        return Ok(None);
    };

    let snapshot = load_snapshot_detail(pool, discovery_id).await?;

    Ok(Some(DiscoveryDetail {
        discovery,
        snapshot,
    }))
}

async fn load_snapshot_detail(
    pool: &PgPool,
    discovery_id: &str,
) -> Result<Option<SnapshotDetail>, StorageError> {
    let header = sqlx::query_as::<_, SnapshotHeader>(
        r#"
        SELECT os_name, os_version, os_kind, kernel_version, cpu_model, cpu_count, memory_total_gb, disk_total_gb, disk_free_gb, last_boot_time, collected_at
        FROM snapshots
        WHERE discovery_id = $1
        "#,
    )
    .bind(discovery_id)
    .fetch_optional(pool)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let interface_rows = sqlx::query_as::<_, InterfaceRow>(
        "SELECT id, name, mac, mtu, state, speed_mbps FROM interfaces WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let address_rows = sqlx::query_as::<_, AddressRow>(
        "SELECT interface_id, address, family, prefix_len FROM addresses WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let mut addresses_by_interface: HashMap<i64, Vec<AddressRow>> = HashMap::new();
    for addr in address_rows {
        addresses_by_interface
            .entry(addr.interface_id)
            .or_default()
            .push(addr);
    }

    let interfaces = interface_rows
        .into_iter()
        .map(|row| InterfaceDetail {
            addresses: addresses_by_interface.remove(&row.id).unwrap_or_default(),
            name: row.name,
            mac: row.mac,
            mtu: row.mtu,
            state: row.state,
            speed_mbps: row.speed_mbps,
        })
        .collect();

    let ports = sqlx::query_as::<_, PortRow>(
        "SELECT local_ip, local_port, remote_ip, remote_port, state, pid, process_name, service FROM ports WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let services = sqlx::query_as::<_, ServiceRow>(
        "SELECT name, display_name, status, start_mode, account FROM services WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let software = sqlx::query_as::<_, SoftwareRow>(
        "SELECT name, version, vendor, install_date FROM software WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let filesystems = sqlx::query_as::<_, FilesystemRow>(
        "SELECT device, mount_point, fs_type, total_bytes, used_bytes, free_bytes, used_percent, inodes_total, inodes_free FROM filesystems WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    let users = sqlx::query_as::<_, UserRow>(
        "SELECT username, terminal, login_time, from_host FROM users WHERE discovery_id = $1 ORDER BY id",
    )
    .bind(discovery_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(SnapshotDetail {
        header,
        interfaces,
        ports,
        services,
        software,
        filesystems,
        users,
    }))
}

/// Fleet-wide aggregate stats: server count, discovery count, success
/// rate, and a region histogram.
pub async fn aggregate_stats(pool: &PgPool) -> Result<Stats, StorageError> {
    let server_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets")
        .fetch_one(pool)
        .await?;

    let discovery_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discoveries")
        .fetch_one(pool)
        .await?;

    let succeeded_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM discoveries WHERE status = 'succeeded'")
            .fetch_one(pool)
            .await?;

    let success_rate = if discovery_count == 0 {
        0.0
    } else {
        (succeeded_count as f64 / discovery_count as f64) * 100.0
    };

    let region_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT region, COUNT(*) FROM targets GROUP BY region",
    )
    .fetch_all(pool)
    .await?;
    let region_distribution = region_rows.into_iter().collect();

    Ok(Stats {
        server_count,
        discovery_count,
        success_rate,
        region_distribution,
    })
}

#[cfg(test)]
#[path = "queries_tests.rs"]
mod tests;
