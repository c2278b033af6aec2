// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn test_config() -> ApiConfig {
    ApiConfig::default()
}

#[sqlx::test(migrations = "../sd-storage/migrations")]
async fn stats_endpoint_returns_zeroed_stats_on_empty_db(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let app = build_router(pool, &test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[sqlx::test(migrations = "../sd-storage/migrations")]
async fn server_detail_returns_404_for_unknown_id(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let app = build_router(pool, &test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/servers/does-not-exist")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrations = "../sd-storage/migrations")]
async fn ad_hoc_query_endpoint_rejects_mutation(pool: sqlx::PgPool) -> sqlx::Result<()> {
    let app = build_router(pool, &test_config());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query":"DELETE FROM targets"}"#))
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
