// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The value type held by `sd-cache`. Kept in `sd-core` so both the cache
//! and the orchestrator can share it without a dependency cycle.

use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};

/// A cached Snapshot plus the time it was inserted.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Snapshot,
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(snapshot: Snapshot, inserted_at: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            inserted_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.inserted_at < ttl
    }
}
