// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a probe's `server_details.json` payload into a normalized
//! [`sd_core::Snapshot`], enforcing the fleet discovery contract's
//! validation and coercion rules.

mod error;
mod normalize;
mod raw;

pub use error::ParseError;
pub use raw::ProbeDocument;

use chrono::{DateTime, Utc};
use sd_core::Snapshot;

/// Parses and normalizes a probe's JSON payload, stamping it with the time
/// it was collected (supplied by the caller so this crate stays clock-free).
pub fn parse_snapshot(bytes: &[u8], collected_at: DateTime<Utc>) -> Result<Snapshot, ParseError> {
    let doc: ProbeDocument = serde_json::from_slice(bytes)?;
    normalize::normalize(doc, collected_at)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
