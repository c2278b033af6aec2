// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validates and executes ad-hoc, operator-supplied read-only SQL for the
//! `POST /query` escape hatch. Every statement is checked against a
//! keyword denylist before it ever reaches the pool; nothing here
//! attempts to parse or rewrite the SQL beyond that check.

use crate::error::StorageError;
use serde_json::{Map, Value};
use sqlx::{Column, PgPool, Row, TypeInfo};

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "grant", "revoke",
    "copy", "vacuum", "--", ";",
];

/// Rejects anything but a single `SELECT` statement. The semicolon and
/// comment-marker bans exist to stop statement stacking and obfuscation,
/// not to make this a real SQL parser.
pub fn validate_read_only(sql: &str) -> Result<(), StorageError> {
    let trimmed = sql.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if !lowered.starts_with("select") && !lowered.starts_with("with") {
        return Err(StorageError::UnsafeQuery(
            "only SELECT (or WITH ... SELECT) statements are allowed".to_string(),
        ));
    }

    for keyword in FORBIDDEN_KEYWORDS {
        if lowered.contains(keyword) {
            return Err(StorageError::UnsafeQuery(format!(
                "statement contains forbidden keyword or token: {keyword}"
            )));
        }
    }

    Ok(())
}

/// Runs a validated read-only statement and converts each row into a JSON
/// object, keyed by column name. Handles the common Postgres scalar types;
/// anything else is rendered as its text representation.
pub async fn run_ad_hoc_query(pool: &PgPool, sql: &str) -> Result<Vec<Value>, StorageError> {
    validate_read_only(sql)?;

    let rows = sqlx::query(sql).fetch_all(pool).await?;
    let mut results = Vec::with_capacity(rows.len());
    for row in &rows {
        results.push(row_to_json(row));
    }
    Ok(results)
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    let mut obj = Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = column_to_json(row, column);
        obj.insert(name.to_string(), value);
    }
    Value::Object(obj)
}

fn column_to_json(row: &sqlx::postgres::PgRow, column: &sqlx::postgres::PgColumn) -> Value {
    let ordinal = column.ordinal();
    let type_name = column.type_info().name();

    match type_name {
        "INT2" | "INT4" => row
            .try_get::<Option<i32>, _>(ordinal)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "INT8" => row
            .try_get::<Option<i64>, _>(ordinal)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT4" | "FLOAT8" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(ordinal)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "BOOL" => row
            .try_get::<Option<bool>, _>(ordinal)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" | "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(ordinal)
            .ok()
            .flatten()
            .map(|v| Value::from(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(ordinal)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(ordinal)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
#[path = "query_guard_tests.rs"]
mod tests;
