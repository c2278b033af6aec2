// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A Transport that always reports a connect failure. Useful as a safe
//! default when a transport kind hasn't been wired up yet.

use crate::{CommandOutput, Transport, TransportError};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn exec(
        &mut self,
        _cmd: &str,
        _stdin: Option<&[u8]>,
        _timeout: Duration,
    ) -> Result<CommandOutput, TransportError> {
        Err(TransportError::ConnectRefused(
            "noop transport never connects".to_string(),
        ))
    }

    async fn upload(&mut self, _path: &str, _bytes: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::ConnectRefused(
            "noop transport never connects".to_string(),
        ))
    }

    async fn download(&mut self, _path: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::ConnectRefused(
            "noop transport never connects".to_string(),
        ))
    }

    async fn close(&mut self) {}
}
