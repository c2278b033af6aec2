// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-storage: the relational persistence layer and read-model queries
//! for the fleet discovery engine. Owns the schema migrations, the
//! transactional write path for a finished Discovery, and every query
//! `sd-api` exposes over HTTP.

pub mod error;
pub mod model;
pub mod persist;
pub mod queries;
pub mod query_guard;

pub use error::StorageError;
pub use persist::persist_discovery;

use sqlx::postgres::{PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::time::Duration;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connection parameters for the Postgres-backed store, mirroring the
/// `[database]` table in the controller's config file.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: SslMode,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Prefer,
    Require,
}

impl DatabaseConfig {
    fn connect_options(&self) -> sqlx::postgres::PgConnectOptions {
        let ssl_mode = match self.sslmode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        };
        sqlx::postgres::PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(ssl_mode)
    }
}

/// Opens a connection pool and applies any pending migrations. Called once
/// at controller startup; the returned pool is shared by every worker and
/// by `sd-api`.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
    let pool = connect(config).await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Opens a connection pool without applying migrations. For read-only
/// clients (`sdisc`) that must never alter the schema.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(config.connect_options())
        .await?;
    Ok(pool)
}
