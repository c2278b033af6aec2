// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sd-transport: authenticated remote command execution over WinRM and SSH,
//! behind a single capability set.

mod ssh;
mod winrm;

pub use ssh::SshTransport;
pub use winrm::WinrmTransport;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Exit code, stdout, and stderr of a remote command. Output may be binary;
/// callers must not assume UTF-8.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors from a Transport. Distinguishes failures that happen getting a
/// session up (retryable at the scheduler layer) from the remote command
/// itself returning a non-zero exit (terminal).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect refused: {0}")]
    ConnectRefused(String),
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("remote stream ended unexpectedly: {0}")]
    StreamEof(String),
}

impl TransportError {
    /// All `TransportError` variants are classified as a "Transport"
    /// failure kind; a non-zero exit from `exec` is a separate, "Remote"
    /// failure that `CommandOutput` represents directly rather than as an
    /// error, since the call itself succeeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::DeadlineExceeded(_))
    }
}

/// Authenticated session capable of exec/upload/download against one host.
///
/// Implementations must not share a single session across concurrent
/// callers; `sd-pool` is responsible for that invariant.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Run a command remotely, capturing stdout/stderr. `stdin` is piped in
    /// verbatim when present.
    async fn exec(
        &mut self,
        cmd: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<CommandOutput, TransportError>;

    /// Upload `bytes` to `path` on the remote host.
    async fn upload(&mut self, path: &str, bytes: &[u8]) -> Result<(), TransportError>;

    /// Download the contents of `path` from the remote host.
    async fn download(&mut self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Release the underlying connection. Idempotent.
    async fn close(&mut self);
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};

pub mod noop;
pub use noop::NoopTransport;
