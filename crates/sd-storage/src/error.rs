// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failures from the persistence layer and read-model queries. The caller
/// maps these to a `FailureKind::Persist` at the call site; this crate
/// itself stays agnostic of `Discovery`'s status bookkeeping.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("rejected ad-hoc query: {0}")]
    UnsafeQuery(String),
}
