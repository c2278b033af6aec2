// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-api: the read-only HTTP surface over the persisted fleet inventory.
//! Every handler delegates straight to `sd_storage::queries`; this crate
//! owns only routing, error-to-status mapping, and CORS.

pub mod cors;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Read API listener configuration, mirroring the `[api]` table in the
/// controller's config file.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Builds the full router: every endpoint in the read contract, traced,
/// and CORS-wrapped per `config`.
pub fn build_router(db: PgPool, config: &ApiConfig) -> Router {
    let state = AppState::new(db);

    Router::new()
        .route("/stats", get(handlers::stats))
        .route("/servers", get(handlers::list_servers))
        .route("/servers/:id", get(handlers::server_detail))
        .route("/servers/:id/discoveries", get(handlers::server_discoveries))
        .route("/discoveries/:id", get(handlers::discovery_detail))
        .route("/query", post(handlers::ad_hoc_query))
        .layer(TraceLayer::new_for_http())
        .layer(cors::cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Serves the router on `0.0.0.0:{config.port}` until `shutdown` resolves.
/// `shutdown` is driven by the façade's own signal handling so the API
/// server and the discovery workers stop together.
pub async fn serve(
    db: PgPool,
    config: ApiConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(db, &config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "read API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
