// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `hostname:port:transport` key shared by the connection pool and the
//! result cache.

use crate::target::{Target, TransportKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hostname: &str, port: u16, transport: TransportKind) -> Self {
        Self(format!("{hostname}:{port}:{}", transport.as_str()))
    }

    pub fn for_target(target: &Target) -> Self {
        Self::new(&target.hostname, target.port, target.transport)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
