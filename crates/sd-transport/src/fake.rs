// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for orchestrator/scheduler tests.

use crate::{CommandOutput, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded transport call, for assertions about what the orchestrator did.
#[derive(Debug, Clone)]
pub enum TransportCall {
    Exec { cmd: String },
    Upload { path: String, len: usize },
    Download { path: String },
    Close,
}

/// Scripted behavior a `FakeTransport` executes an `exec` against.
#[derive(Clone)]
pub enum ExecScript {
    Output(CommandOutput),
    Fail(Arc<dyn Fn() -> TransportError + Send + Sync>),
    /// Simulates a probe that runs longer than the caller's timeout.
    Sleep(Duration),
}

#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    calls: Vec<TransportCall>,
    exec_script: HashMap<String, ExecScript>,
    default_exec: ExecScript,
    files: HashMap<String, Vec<u8>>,
    connect_error: Option<Arc<dyn Fn() -> TransportError + Send + Sync>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                calls: Vec::new(),
                exec_script: HashMap::new(),
                default_exec: ExecScript::Output(CommandOutput {
                    exit_code: 0,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                }),
                files: HashMap::new(),
                connect_error: None,
            })),
        }
    }

    /// Makes every `exec`/`upload`/`download` fail immediately, as if the
    /// dial itself had failed.
    pub fn failing_to_connect(error: impl Fn() -> TransportError + Send + Sync + 'static) -> Self {
        let t = Self::new();
        t.inner.lock().connect_error = Some(Arc::new(error));
        t
    }

    pub fn script_exec(&self, cmd: impl Into<String>, script: ExecScript) {
        self.inner.lock().exec_script.insert(cmd.into(), script);
    }

    pub fn seed_file(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.inner.lock().files.insert(path.into(), bytes);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    pub fn exec_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, TransportCall::Exec { .. }))
            .count()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn exec(
        &mut self,
        cmd: &str,
        _stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<CommandOutput, TransportError> {
        if let Some(err) = self.inner.lock().connect_error.as_ref() {
            return Err(err());
        }
        self.inner.lock().calls.push(TransportCall::Exec {
            cmd: cmd.to_string(),
        });
        let script = {
            let inner = self.inner.lock();
            inner
                .exec_script
                .get(cmd)
                .cloned()
                .unwrap_or_else(|| inner.default_exec.clone())
        };
        match script {
            ExecScript::Output(out) => Ok(out),
            ExecScript::Fail(f) => Err(f()),
            ExecScript::Sleep(d) => {
                if d > timeout {
                    tokio::time::sleep(timeout).await;
                    Err(TransportError::DeadlineExceeded(timeout))
                } else {
                    tokio::time::sleep(d).await;
                    Ok(CommandOutput {
                        exit_code: 0,
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                    })
                }
            }
        }
    }

    async fn upload(&mut self, path: &str, bytes: &[u8]) -> Result<(), TransportError> {
        if let Some(err) = self.inner.lock().connect_error.as_ref() {
            return Err(err());
        }
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Upload {
            path: path.to_string(),
            len: bytes.len(),
        });
        inner.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn download(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        if let Some(err) = self.inner.lock().connect_error.as_ref() {
            return Err(err());
        }
        let mut inner = self.inner.lock();
        inner.calls.push(TransportCall::Download {
            path: path.to_string(),
        });
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::DownloadFailed(format!("no such file: {path}")))
    }

    async fn close(&mut self) {
        self.inner.lock().calls.push(TransportCall::Close);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
