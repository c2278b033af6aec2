// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::error::Error as StdError;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorWrapper {
    error: ProblemDetails,
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    title: String,
    detail: Option<String>,
}

/// Errors the read API can return, mapped to an HTTP status at the
/// response boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] sd_storage::StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage(sd_storage::StorageError::Database(sqlx::Error::RowNotFound)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Storage(sd_storage::StorageError::UnsafeQuery(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(status = ?status, message = ?self, details = ?self.source());
        }

        let body = Json(ErrorWrapper {
            error: ProblemDetails {
                title: self.to_string(),
                detail: self.source().map(ToString::to_string),
            },
        });

        (status, body).into_response()
    }
}
