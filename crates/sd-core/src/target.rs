// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The intent to probe a host. Immutable for the lifetime of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

crate::define_id! {
    /// Unique identifier for a target host.
    #[derive(Default)]
    pub struct TargetId;
}

/// Which remote-execution protocol a target speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Winrm,
    Ssh,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Winrm => "winrm",
            TransportKind::Ssh => "ssh",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Winrm => 5985,
            TransportKind::Ssh => 22,
        }
    }
}

/// Credentials needed to authenticate a [`Transport`](crate) session.
/// Read verbatim from config; this system does not manage secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: Option<String>,
    /// Path to a private key file, for SSH key-based auth.
    pub key_path: Option<String>,
}

/// A host the system intends to probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub hostname: String,
    pub transport: TransportKind,
    pub port: u16,
    pub credential: Credential,
    pub region: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// WinRM-only: trust the remote TLS certificate without verification.
    #[serde(default)]
    pub skip_cert_verify: bool,
    /// WinRM-only: speak HTTPS rather than HTTP to the listener.
    #[serde(default)]
    pub use_https: bool,
    /// Overrides the controller-wide per-Discovery deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Target {
    pub fn new(
        id: impl Into<String>,
        hostname: impl Into<String>,
        transport: TransportKind,
        port: u16,
        credential: Credential,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: TargetId::new(id),
            hostname: hostname.into(),
            transport,
            port,
            credential,
            region: region.into(),
            tags: HashMap::new(),
            skip_cert_verify: false,
            use_https: false,
            timeout: None,
            created_at: Utc::now(),
            last_checked: None,
        }
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
