// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn accepts_plain_select() {
    assert!(validate_read_only("SELECT * FROM targets").is_ok());
}

#[test]
fn accepts_select_with_leading_whitespace_and_case() {
    assert!(validate_read_only("  select hostname from targets ").is_ok());
}

#[test]
fn accepts_with_cte() {
    assert!(validate_read_only("WITH t AS (SELECT 1) SELECT * FROM t").is_ok());
}

#[test]
fn rejects_insert() {
    let err = validate_read_only("INSERT INTO targets (id) VALUES ('x')").unwrap_err();
    assert!(matches!(err, StorageError::UnsafeQuery(_)));
}

#[test]
fn rejects_statement_stacking() {
    assert!(validate_read_only("SELECT 1; DROP TABLE targets").is_err());
}

#[test]
fn rejects_comment_smuggling() {
    assert!(validate_read_only("SELECT 1 -- ; DELETE FROM targets").is_err());
}

#[test]
fn rejects_update_disguised_in_mixed_case() {
    assert!(validate_read_only("SELECT 1; UpDaTe targets SET region = 'x'").is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn run_ad_hoc_query_converts_rows_to_json(pool: sqlx::PgPool) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO targets (id, hostname, transport_kind, port, region, username) VALUES ('t1', 'h1', 'ssh', 22, 'us-east-1', 'svc')",
    )
    .execute(&pool)
    .await?;

    let rows = run_ad_hoc_query(&pool, "SELECT hostname, port FROM targets")
        .await
        .expect("ad-hoc query should succeed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hostname"], serde_json::json!("h1"));
    assert_eq!(rows[0]["port"], serde_json::json!(22));

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn run_ad_hoc_query_rejects_mutation(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let result = run_ad_hoc_query(&pool, "DELETE FROM targets").await;
    assert!(result.is_err());
    Ok(())
}
