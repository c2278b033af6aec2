// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One execution attempt against one [`Target`](crate::target::Target).

use crate::target::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a discovery attempt.
    #[derive(Default)]
    pub struct DiscoveryId;
}

/// Why a Discovery failed, carried alongside the terminal status so callers
/// can expose `error`/`message` without re-deriving them from prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Remote,
    Timeout,
    Parse,
    Persist,
    Cancel,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Remote => "remote",
            FailureKind::Timeout => "timeout",
            FailureKind::Parse => "parse",
            FailureKind::Persist => "persist",
            FailureKind::Cancel => "cancel",
        }
    }

    /// Transport and Timeout failures are retried at the scheduler layer;
    /// Remote and Parse are terminal; Persist/Cancel are handled specially
    /// (see `sd-scheduler`).
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transport | FailureKind::Timeout)
    }
}

/// Terminal status of a Discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl DiscoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryStatus::Succeeded => "succeeded",
            DiscoveryStatus::Failed => "failed",
            DiscoveryStatus::TimedOut => "timed_out",
            DiscoveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, DiscoveryStatus::Succeeded)
    }
}

/// One execution attempt against one Target, terminal in some status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub id: DiscoveryId,
    pub target_id: TargetId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub status: Option<DiscoveryStatus>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
    /// 1-based attempt number within a single scheduler retry loop for this Target.
    pub attempt: u32,
}

impl Discovery {
    pub fn start(id: DiscoveryId, target_id: TargetId, start: DateTime<Utc>, attempt: u32) -> Self {
        Self {
            id,
            target_id,
            start,
            end: None,
            status: None,
            message: String::new(),
            error: None,
            error_detail: None,
            artifact_path: None,
            attempt,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_some()
    }

    pub fn finish_succeeded(&mut self, end: DateTime<Utc>, artifact_path: String) {
        self.end = Some(end);
        self.status = Some(DiscoveryStatus::Succeeded);
        self.artifact_path = Some(artifact_path);
        self.message = "discovery succeeded".to_string();
    }

    pub fn finish_failed(
        &mut self,
        end: DateTime<Utc>,
        status: DiscoveryStatus,
        kind: FailureKind,
        message: String,
        detail: Option<String>,
    ) {
        self.end = Some(end);
        self.status = Some(status);
        self.error = Some(kind);
        self.message = message;
        self.error_detail = detail;
    }

    /// Marks the Discovery as satisfied by a warm cache hit rather than a
    /// fresh probe execution.
    pub fn finish_from_cache(&mut self, end: DateTime<Utc>, artifact_path: String) {
        self.end = Some(end);
        self.status = Some(DiscoveryStatus::Succeeded);
        self.artifact_path = Some(artifact_path);
        self.message = "served from cache".to_string();
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
