// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches a Target's `TransportKind` to the concrete Transport
//! implementation. Kept separate from `ConnectionPool` so tests can swap
//! in a `FakeTransport`-backed dialer without touching pool logic.

use async_trait::async_trait;
use sd_core::{Fingerprint, Target, TransportKind};
use sd_transport::{SshTransport, Transport, TransportError, WinrmTransport};
use std::time::Duration;

/// Creates an authenticated Transport for a Target. Implementations own
/// connect-timeout policy; the pool only calls `dial` outside its lock.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, target: &Target) -> Result<Box<dyn Transport>, TransportError>;
}

/// Production dialer: builds a `WinrmTransport` or `SshTransport`
/// depending on `target.transport`.
#[derive(Clone, Copy)]
pub struct RealDialer {
    pub connect_timeout: Duration,
}

impl RealDialer {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for RealDialer {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Dialer for RealDialer {
    async fn dial(&self, target: &Target) -> Result<Box<dyn Transport>, TransportError> {
        match target.transport {
            TransportKind::Ssh => {
                let transport = SshTransport::connect(
                    &target.hostname,
                    target.port,
                    &target.credential,
                    self.connect_timeout,
                )
                .await?;
                Ok(Box::new(transport))
            }
            TransportKind::Winrm => {
                let transport = WinrmTransport::connect(
                    &target.hostname,
                    target.port,
                    &target.credential,
                    target.use_https,
                    target.skip_cert_verify,
                    self.connect_timeout,
                )
                .await?;
                Ok(Box::new(transport))
            }
        }
    }
}

/// Test dialer: hands out clones of a pre-registered `FakeTransport` per
/// fingerprint and counts how many times each fingerprint was actually
/// dialed, so tests can assert the inflight-dial-gate invariant.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeDialer {
    transports: parking_lot::Mutex<std::collections::HashMap<Fingerprint, sd_transport::FakeTransport>>,
    dial_counts: parking_lot::Mutex<std::collections::HashMap<Fingerprint, usize>>,
    fail: parking_lot::Mutex<std::collections::HashSet<Fingerprint>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeDialer {
    pub fn new() -> Self {
        Self {
            transports: parking_lot::Mutex::new(std::collections::HashMap::new()),
            dial_counts: parking_lot::Mutex::new(std::collections::HashMap::new()),
            fail: parking_lot::Mutex::new(std::collections::HashSet::new()),
        }
    }

    pub fn register(&self, fingerprint: Fingerprint, transport: sd_transport::FakeTransport) {
        self.transports.lock().insert(fingerprint, transport);
    }

    pub fn fail_next(&self, fingerprint: Fingerprint) {
        self.fail.lock().insert(fingerprint);
    }

    pub fn dial_count(&self, fingerprint: &Fingerprint) -> usize {
        self.dial_counts.lock().get(fingerprint).copied().unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, target: &Target) -> Result<Box<dyn Transport>, TransportError> {
        let fingerprint = Fingerprint::for_target(target);
        *self.dial_counts.lock().entry(fingerprint.clone()).or_insert(0) += 1;

        if self.fail.lock().remove(&fingerprint) {
            return Err(TransportError::ConnectRefused("fake dial failure".to_string()));
        }

        let transport = self
            .transports
            .lock()
            .entry(fingerprint)
            .or_insert_with(sd_transport::FakeTransport::new)
            .clone();
        Ok(Box::new(transport))
    }
}
