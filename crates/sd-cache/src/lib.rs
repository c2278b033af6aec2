// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-cache: fingerprint → Snapshot memoization with a TTL and an
//! at-most-one-inflight-probe-per-fingerprint gate.
//!
//! Not authoritative: a latency/cost optimization in front of the
//! persistence layer, never the source of truth for a Discovery's result.

use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use sd_core::{CacheEntry, Clock, Fingerprint, Snapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct ResultCache<C: Clock> {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    gates: Mutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>,
    ttl: ChronoDuration,
    clock: C,
}

/// What `acquire` found: either a fresh cached result, or exclusive
/// permission to run a probe and populate the cache.
pub enum Acquired<'a, C: Clock> {
    Hit(Snapshot),
    Miss(CacheGuard<'a, C>),
}

/// Held from cache-miss through cache-insert. Dropping it without calling
/// [`CacheGuard::insert`] (a failed Discovery) simply releases the gate
/// for the next caller to retry.
pub struct CacheGuard<'a, C: Clock> {
    cache: &'a ResultCache<C>,
    fingerprint: Fingerprint,
    _permit: OwnedMutexGuard<()>,
}

impl<'a, C: Clock> CacheGuard<'a, C> {
    pub fn insert(self, snapshot: Snapshot) {
        self.cache.insert(self.fingerprint.clone(), snapshot);
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn new(ttl: ChronoDuration, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn gate_for(&self, fingerprint: &Fingerprint) -> Arc<AsyncMutex<()>> {
        self.gates
            .lock()
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn fresh(&self, fingerprint: &Fingerprint) -> Option<Snapshot> {
        let entries = self.entries.lock();
        entries
            .get(fingerprint)
            .filter(|e| e.is_fresh(self.clock.utc_now(), self.ttl))
            .map(|e| e.snapshot.clone())
    }

    fn insert(&self, fingerprint: Fingerprint, snapshot: Snapshot) {
        self.entries
            .lock()
            .insert(fingerprint, CacheEntry::new(snapshot, self.clock.utc_now()));
    }

    /// Looks up `fingerprint`. Returns a fresh hit immediately, or acquires
    /// the per-fingerprint gate and hands back a guard the caller must
    /// resolve (insert on success, drop on failure) before any other
    /// caller's probe for the same fingerprint can proceed.
    pub async fn acquire(&self, fingerprint: &Fingerprint) -> Acquired<'_, C> {
        if let Some(hit) = self.fresh(fingerprint) {
            return Acquired::Hit(hit);
        }
        let gate = self.gate_for(fingerprint);
        let permit = gate.lock_owned().await;

        // Another caller may have inserted while we waited for the gate.
        if let Some(hit) = self.fresh(fingerprint) {
            return Acquired::Hit(hit);
        }

        Acquired::Miss(CacheGuard {
            cache: self,
            fingerprint: fingerprint.clone(),
            _permit: permit,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
