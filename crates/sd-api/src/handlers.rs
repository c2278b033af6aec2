// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use sd_storage::model::{DiscoveryDetail, DiscoverySummary, Stats, TargetDetail, TargetSummary};
use sd_storage::{query_guard, queries};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let stats = queries::aggregate_stats(state.db()).await?;
    Ok(Json(stats))
}

pub async fn list_servers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TargetSummary>>, ApiError> {
    let targets = queries::list_targets(state.db()).await?;
    Ok(Json(targets))
}

pub async fn server_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TargetDetail>, ApiError> {
    let detail = queries::target_detail(state.db(), &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(detail))
}

pub async fn server_discoveries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DiscoverySummary>>, ApiError> {
    let history = queries::discovery_history(state.db(), &id).await?;
    Ok(Json(history))
}

pub async fn discovery_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DiscoveryDetail>, ApiError> {
    let detail = queries::discovery_detail(state.db(), &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct AdHocQuery {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AdHocQueryResponse {
    pub rows: Vec<Value>,
}

pub async fn ad_hoc_query(
    State(state): State<AppState>,
    Json(payload): Json<AdHocQuery>,
) -> Result<Json<AdHocQueryResponse>, ApiError> {
    let rows = query_guard::run_ad_hoc_query(state.db(), &payload.query).await?;
    Ok(Json(AdHocQueryResponse { rows }))
}
