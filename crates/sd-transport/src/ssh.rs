// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH-over-TCP transport for Linux targets, backed by `russh`.

use crate::{CommandOutput, Transport, TransportError};
use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key;
use sd_core::Credential;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Accepts any host key. Fleet discovery targets host keys that are not
/// pre-provisioned into a known_hosts file; TOFU verification is left to
/// operator-managed tooling outside this system's scope.
struct AcceptAllHostKeys;

#[async_trait]
impl russh::client::Handler for AcceptAllHostKeys {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// An authenticated SSH session to one host.
pub struct SshTransport {
    handle: Option<Handle<AcceptAllHostKeys>>,
}

impl SshTransport {
    /// Dial and authenticate. `connect_timeout` bounds the TCP connect and
    /// the authentication exchange together.
    pub async fn connect(
        hostname: &str,
        port: u16,
        credential: &Credential,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let config = Arc::new(russh::client::Config::default());
        let addr = format!("{hostname}:{port}");

        let mut handle = tokio::time::timeout(
            connect_timeout,
            russh::client::connect(config, addr, AcceptAllHostKeys),
        )
        .await
        .map_err(|_| TransportError::DeadlineExceeded(connect_timeout))?
        .map_err(|e| TransportError::ConnectRefused(e.to_string()))?;

        let authenticated = if let Some(key_path) = &credential.key_path {
            let key_pair = tokio::time::timeout(connect_timeout, async {
                russh_keys::load_secret_key(Path::new(key_path), None)
            })
            .await
            .map_err(|_| TransportError::DeadlineExceeded(connect_timeout))?
            .map_err(|e| TransportError::AuthRejected(format!("invalid key file: {e}")))?;

            handle
                .authenticate_publickey(&credential.username, Arc::new(key_pair))
                .await
                .map_err(|e| TransportError::AuthRejected(e.to_string()))?
        } else {
            let password = credential.password.as_deref().unwrap_or_default();
            handle
                .authenticate_password(&credential.username, password)
                .await
                .map_err(|e| TransportError::AuthRejected(e.to_string()))?
        };

        if !authenticated {
            warn!(hostname, "ssh auth rejected");
            return Err(TransportError::AuthRejected(
                "remote host rejected the supplied credential".to_string(),
            ));
        }

        debug!(hostname, "ssh session authenticated");
        Ok(Self {
            handle: Some(handle),
        })
    }

    fn handle(&mut self) -> Result<&mut Handle<AcceptAllHostKeys>, TransportError> {
        self.handle
            .as_mut()
            .ok_or_else(|| TransportError::StreamEof("session already closed".to_string()))
    }

    async fn open_channel(&mut self) -> Result<Channel<Msg>, TransportError> {
        self.handle()?
            .channel_open_session()
            .await
            .map_err(|e| TransportError::ConnectRefused(e.to_string()))
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn exec(
        &mut self,
        cmd: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<CommandOutput, TransportError> {
        let run = async {
            let mut channel = self.open_channel().await?;
            channel
                .exec(true, cmd)
                .await
                .map_err(|e| TransportError::StreamEof(e.to_string()))?;

            if let Some(input) = stdin {
                channel
                    .data(input)
                    .await
                    .map_err(|e| TransportError::StreamEof(e.to_string()))?;
                channel
                    .eof()
                    .await
                    .map_err(|e| TransportError::StreamEof(e.to_string()))?;
            }

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut exit_code = 0i32;

            loop {
                match channel.wait().await {
                    Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                    Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                        stderr.extend_from_slice(&data)
                    }
                    Some(ChannelMsg::ExitStatus { exit_status }) => {
                        exit_code = exit_status as i32;
                    }
                    Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                    _ => {}
                }
            }

            Ok(CommandOutput {
                exit_code,
                stdout,
                stderr,
            })
        };

        tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| TransportError::DeadlineExceeded(timeout))?
    }

    async fn upload(&mut self, path: &str, bytes: &[u8]) -> Result<(), TransportError> {
        // No sftp dependency carried solely for a one-shot upload: stage the
        // payload through the shell via base64, then chmod it executable.
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let cmd = format!("base64 -d > {path} <<'SD_PROBE_EOF'\n{encoded}\nSD_PROBE_EOF\nchmod +x {path}");
        let out = self.exec(&cmd, None, Duration::from_secs(60)).await?;
        if !out.success() {
            return Err(TransportError::UploadFailed(format!(
                "remote staging command exited {}: {}",
                out.exit_code,
                String::from_utf8_lossy(&out.stderr)
            )));
        }
        Ok(())
    }

    async fn download(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        let cmd = format!("base64 {path}");
        let out = self.exec(&cmd, None, Duration::from_secs(60)).await?;
        if !out.success() {
            return Err(TransportError::DownloadFailed(format!(
                "remote cat command exited {}: {}",
                out.exit_code,
                String::from_utf8_lossy(&out.stderr)
            )));
        }
        let text = String::from_utf8_lossy(&out.stdout);
        base64::engine::general_purpose::STANDARD
            .decode(text.trim())
            .map_err(|e| TransportError::DownloadFailed(format!("invalid base64: {e}")))
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.disconnect(Disconnect::ByApplication, "", "en").await {
                warn!(error = %e, "ssh disconnect failed (may be expected)");
            }
        }
    }
}

use base64::Engine as _;

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
