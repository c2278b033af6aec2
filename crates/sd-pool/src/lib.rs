// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-pool: a bounded LRU of reusable authenticated Transport sessions,
//! keyed by `Fingerprint`.

mod dialer;

pub use dialer::{Dialer, RealDialer};
#[cfg(any(test, feature = "test-support"))]
pub use dialer::FakeDialer;

use parking_lot::Mutex;
use sd_core::{Fingerprint, Target};
use sd_transport::{Transport, TransportError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

struct Slot {
    transport: Box<dyn Transport>,
    last_used: Instant,
}

struct Inner<D: Dialer> {
    dialer: D,
    capacity: usize,
    idle_timeout: Duration,
    slots: Mutex<HashMap<Fingerprint, Slot>>,
    /// LRU order, most-recently-used last. Kept separate from `slots` so
    /// eviction doesn't need to scan the whole map.
    lru: Mutex<Vec<Fingerprint>>,
    /// Per-fingerprint dial gate: a caller racing another for the same
    /// absent entry waits here rather than dialing twice.
    dial_gates: Mutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>,
}

/// A bounded mapping from fingerprint to a live [`Transport`]:
/// capacity-bounded LRU eviction, idle eviction on access, and a
/// per-fingerprint dial gate so concurrent callers for the same absent
/// entry share one dial rather than racing.
pub struct ConnectionPool<D: Dialer> {
    inner: Arc<Inner<D>>,
}

impl<D: Dialer> Clone for ConnectionPool<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dialer> ConnectionPool<D> {
    pub fn new(dialer: D, capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                dialer,
                capacity,
                idle_timeout,
                slots: Mutex::new(HashMap::new()),
                lru: Mutex::new(Vec::new()),
                dial_gates: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn gate_for(&self, fingerprint: &Fingerprint) -> Arc<AsyncMutex<()>> {
        self.inner
            .dial_gates
            .lock()
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn touch(&self, fingerprint: &Fingerprint) {
        let mut lru = self.inner.lru.lock();
        lru.retain(|f| f != fingerprint);
        lru.push(fingerprint.clone());
    }

    fn remove_from_lru(&self, fingerprint: &Fingerprint) {
        self.inner.lru.lock().retain(|f| f != fingerprint);
    }

    /// Evicts (and closes) entries over capacity. Called with the slot
    /// lock already released, so closing the evicted transport never
    /// blocks a concurrent `get`.
    async fn evict_over_capacity(&self) {
        loop {
            let victim = {
                let lru = self.inner.lru.lock();
                if lru.len() <= self.inner.capacity {
                    None
                } else {
                    lru.first().cloned()
                }
            };
            let Some(victim) = victim else { break };
            let slot = {
                let mut slots = self.inner.slots.lock();
                slots.remove(&victim)
            };
            self.remove_from_lru(&victim);
            if let Some(mut slot) = slot {
                debug!(fingerprint = %victim, "evicting pooled connection over capacity");
                slot.transport.close().await;
            }
        }
    }

    /// Returns a live Transport for `target`, dialing a new one if absent
    /// or idle-expired. The caller is handed exclusive access; it must
    /// call [`ConnectionPool::checkin`] to return the transport for reuse,
    /// or let it drop to discard it.
    pub async fn get(&self, target: &Target) -> Result<Box<dyn Transport>, TransportError> {
        let fingerprint = Fingerprint::for_target(target);

        // Fast path: a fresh entry already checked in.
        {
            let mut slots = self.inner.slots.lock();
            let idle_timeout = self.inner.idle_timeout;
            let fresh = slots
                .get(&fingerprint)
                .is_some_and(|slot| slot.last_used.elapsed() <= idle_timeout);
            if let Some(slot) = slots.remove(&fingerprint) {
                drop(slots);
                // Checked out, not resident: only `checkin` re-adds it to
                // the LRU list, so a borrowed entry never competes for
                // eviction against entries actually idling in the pool.
                self.remove_from_lru(&fingerprint);
                if fresh {
                    return Ok(slot.transport);
                }
                // Idle-expired: close it instead of handing it back.
                let mut slot = slot;
                slot.transport.close().await;
            }
        }

        // Absent or just evicted: dial outside the map lock, serialized
        // per-fingerprint so concurrent callers share one dial.
        let gate = self.gate_for(&fingerprint);
        let _permit = gate.lock().await;

        // Another caller may have dialed and checked in while we waited.
        {
            let mut slots = self.inner.slots.lock();
            if let Some(slot) = slots.remove(&fingerprint) {
                drop(slots);
                self.remove_from_lru(&fingerprint);
                return Ok(slot.transport);
            }
        }

        debug!(fingerprint = %fingerprint, "dialing new connection");
        self.inner.dialer.dial(target).await
    }

    /// Returns a Transport to the pool for reuse, evicting the
    /// least-recently-used entry first if the pool is at capacity.
    pub async fn checkin(&self, target: &Target, transport: Box<dyn Transport>) {
        let fingerprint = Fingerprint::for_target(target);
        {
            let mut slots = self.inner.slots.lock();
            slots.insert(
                fingerprint.clone(),
                Slot {
                    transport,
                    last_used: Instant::now(),
                },
            );
        }
        self.touch(&fingerprint);
        self.evict_over_capacity().await;
    }

    /// Closes and removes every pooled entry. Idempotent.
    pub async fn close_all(&self) {
        let all: Vec<(Fingerprint, Slot)> = {
            let mut slots = self.inner.slots.lock();
            slots.drain().collect()
        };
        self.inner.lru.lock().clear();
        for (_, mut slot) in all {
            slot.transport.close().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
