// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WinRM-over-HTTP(S) transport for Windows targets, built on the WS-Man
//! shell/command/receive exchange (`reqwest` does the HTTP/TLS legwork; the
//! SOAP envelopes are hand-built since the wire protocol is small and
//! schema-stable).

use crate::{CommandOutput, Transport, TransportError};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use sd_core::Credential;
use std::time::Duration;
use tracing::{debug, warn};

const RESOURCE_URI: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/cmd";
const SHELL_ACTION: &str =
    "http://schemas.xmlsoap.org/ws/2004/09/transfer/Create";
const COMMAND_ACTION: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Command";
const RECEIVE_ACTION: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Receive";
const SIGNAL_ACTION: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/Signal";
const DELETE_ACTION: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Delete";

/// An authenticated WinRM session to one host. Holds the shell id for the
/// lifetime of the connection; each `exec` opens and tears down its own
/// command within that shell.
pub struct WinrmTransport {
    client: Client,
    endpoint: String,
    shell_id: Option<String>,
}

impl WinrmTransport {
    pub async fn connect(
        hostname: &str,
        port: u16,
        credential: &Credential,
        use_https: bool,
        skip_cert_verify: bool,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let scheme = if use_https { "https" } else { "http" };
        let endpoint = format!("{scheme}://{hostname}:{port}/wsman");

        let client = Client::builder()
            .danger_accept_invalid_certs(skip_cert_verify)
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::ConnectRefused(e.to_string()))?;

        let password = credential.password.as_deref().unwrap_or_default();
        let body = soap_envelope(SHELL_ACTION, &endpoint, &shell_create_body());

        let response = client
            .post(&endpoint)
            .basic_auth(&credential.username, Some(password))
            .header("Content-Type", "application/soap+xml;charset=UTF-8")
            .body(body)
            .send()
            .await
            .map_err(classify_send_error)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!(hostname, "winrm auth rejected");
            return Err(TransportError::AuthRejected(
                "remote host rejected the supplied credential".to_string(),
            ));
        }
        if !response.status().is_success() {
            warn!(hostname, status = %response.status(), "winrm shell create failed");
            return Err(TransportError::ConnectRefused(format!(
                "shell create returned HTTP {}",
                response.status()
            )));
        }

        let text = response.text().await.map_err(|e| {
            TransportError::StreamEof(format!("reading shell create response: {e}"))
        })?;
        let shell_id = extract_tag(&text, "w:Selector Name=\"ShellId\"")
            .or_else(|| extract_tag(&text, "rsp:ShellId"))
            .ok_or_else(|| TransportError::ConnectRefused(
                "shell create response missing ShellId".to_string(),
            ))?;

        debug!(hostname, %shell_id, "winrm shell created");
        Ok(Self {
            client,
            endpoint,
            shell_id: Some(shell_id),
        })
    }

    fn shell_id(&self) -> Result<&str, TransportError> {
        self.shell_id
            .as_deref()
            .ok_or_else(|| TransportError::StreamEof("session already closed".to_string()))
    }

    async fn post(&self, action: &str, body: String) -> Result<String, TransportError> {
        let envelope = soap_envelope(action, &self.endpoint, &body);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/soap+xml;charset=UTF-8")
            .body(envelope)
            .send()
            .await
            .map_err(classify_send_error)?;

        if !response.status().is_success() {
            return Err(TransportError::StreamEof(format!(
                "WinRM request failed with HTTP {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| TransportError::StreamEof(e.to_string()))
    }
}

#[async_trait]
impl Transport for WinrmTransport {
    async fn exec(
        &mut self,
        cmd: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<CommandOutput, TransportError> {
        let shell_id = self.shell_id()?.to_string();
        let run = async {
            let command_body = command_line_body(&shell_id, cmd);
            let response = self.post(COMMAND_ACTION, command_body).await?;
            let command_id = extract_tag(&response, "rsp:CommandId").ok_or_else(|| {
                TransportError::StreamEof("command response missing CommandId".to_string())
            })?;

            if let Some(input) = stdin {
                let encoded = base64::engine::general_purpose::STANDARD.encode(input);
                self.post(SIGNAL_ACTION, send_body(&shell_id, &command_id, &encoded))
                    .await?;
            }

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut exit_code = 0i32;

            loop {
                let response = self
                    .post(RECEIVE_ACTION, receive_body(&shell_id, &command_id))
                    .await?;
                for chunk in extract_all_tags(&response, "rsp:Stream") {
                    if chunk.contains("Name=\"stdout\"") {
                        decode_stream_into(&chunk, &mut stdout);
                    } else if chunk.contains("Name=\"stderr\"") {
                        decode_stream_into(&chunk, &mut stderr);
                    }
                }
                if let Some(code) = extract_attr(&response, "ExitCode") {
                    exit_code = code.parse().unwrap_or(0);
                }
                if response.contains("CommandState=\"http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done\"")
                {
                    break;
                }
            }

            self.post(SIGNAL_ACTION, signal_terminate_body(&shell_id, &command_id))
                .await?;

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
        // No separate file-transfer channel over WS-Man: stage the payload
        // as a base64-encoded inline PowerShell script, matching how probe
        // staging already works for Windows.
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let cmd = format!(
            "powershell -NoProfile -Command \"[IO.File]::WriteAllBytes('{path}', [Convert]::FromBase64String('{encoded}'))\""
        );
        let out = self.exec(&cmd, None, Duration::from_secs(120)).await?;
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
        let cmd = format!(
            "powershell -NoProfile -Command \"[Convert]::ToBase64String([IO.File]::ReadAllBytes('{path}'))\""
        );
        let out = self.exec(&cmd, None, Duration::from_secs(120)).await?;
        if !out.success() {
            return Err(TransportError::DownloadFailed(format!(
                "remote read command exited {}: {}",
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
        if let Some(shell_id) = self.shell_id.take() {
            if let Err(e) = self.post(DELETE_ACTION, String::new()).await {
                warn!(%shell_id, error = %e, "winrm shell delete failed (may be expected)");
            }
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::DeadlineExceeded(Duration::from_secs(0))
    } else if e.is_connect() {
        TransportError::ConnectRefused(e.to_string())
    } else {
        TransportError::Tls(e.to_string())
    }
}

fn soap_envelope(action: &str, endpoint: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd"
            xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing"
            xmlns:rsp="http://schemas.microsoft.com/wbem/wsman/1/windows/shell">
  <s:Header>
    <a:To>{endpoint}</a:To>
    <a:Action>{action}</a:Action>
    <w:ResourceURI>{RESOURCE_URI}</w:ResourceURI>
  </s:Header>
  <s:Body>{body}</s:Body>
</s:Envelope>"#
    )
}

fn shell_create_body() -> String {
    "<rsp:Shell><rsp:InputStreams>stdin</rsp:InputStreams><rsp:OutputStreams>stdout stderr</rsp:OutputStreams></rsp:Shell>".to_string()
}

fn command_line_body(shell_id: &str, cmd: &str) -> String {
    format!(
        "<rsp:CommandLine ShellId=\"{shell_id}\"><rsp:Command>{}</rsp:Command></rsp:CommandLine>",
        xml_escape(cmd)
    )
}

fn send_body(shell_id: &str, command_id: &str, base64_stdin: &str) -> String {
    format!(
        "<rsp:Send ShellId=\"{shell_id}\"><rsp:Stream Name=\"stdin\" CommandId=\"{command_id}\" End=\"true\">{base64_stdin}</rsp:Stream></rsp:Send>"
    )
}

fn receive_body(shell_id: &str, command_id: &str) -> String {
    format!(
        "<rsp:Receive ShellId=\"{shell_id}\"><rsp:DesiredStream CommandId=\"{command_id}\">stdout stderr</rsp:DesiredStream></rsp:Receive>"
    )
}

fn signal_terminate_body(shell_id: &str, command_id: &str) -> String {
    format!(
        "<rsp:Signal ShellId=\"{shell_id}\" CommandId=\"{command_id}\"><rsp:Code>http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/terminate</rsp:Code></rsp:Signal>"
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn decode_stream_into(tag_body: &str, out: &mut Vec<u8>) {
    if let Some(start) = tag_body.find('>') {
        let inner = &tag_body[start + 1..];
        if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(inner.trim()) {
            out.extend_from_slice(&bytes);
        }
    }
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let start = xml.find(&open)?;
    let rest = &xml[start..];
    let gt = rest.find('>')?;
    let after_open = &rest[gt + 1..];
    let close = format!("</{}>", tag.split_whitespace().next().unwrap_or(tag));
    let end = after_open.find(&close)?;
    Some(after_open[..end].trim().to_string())
}

fn extract_all_tags(xml: &str, tag: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = xml;
    let open = format!("<{tag}");
    while let Some(start) = cursor.find(&open) {
        let rest = &cursor[start..];
        let close_marker = format!("</{tag}>");
        if let Some(end) = rest.find(&close_marker) {
            out.push(rest[..end + close_marker.len()].to_string());
            cursor = &rest[end + close_marker.len()..];
        } else {
            break;
        }
    }
    out
}

fn extract_attr(xml: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=\"");
    let attr_start = xml.find(&needle)? + needle.len();
    let after = &xml[attr_start..];
    let end = after.find('"')?;
    Some(after[..end].to_string())
}

#[cfg(test)]
#[path = "winrm_tests.rs"]
mod tests;
