// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Why `server_details.json` could not be turned into a Snapshot. All
/// variants map to the orchestrator's "Parse" failure kind, a terminal
/// (non-retryable) Discovery outcome.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}

impl ParseError {
    /// A short diagnostic suitable for `Discovery.error_detail`: a
    /// validator message, truncated upstream by the orchestrator rather
    /// than here.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}
