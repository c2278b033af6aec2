// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four transport-facing stages of the discovery state machine:
//! Staging, Executing, Fetching, and best-effort remote cleanup. Kept
//! separate from
//! `run_discovery`'s status bookkeeping so each stage can be unit tested
//! against a `FakeTransport` in isolation.

use crate::config::ProbeSpec;
use chrono::{DateTime, Utc};
use sd_core::TransportKind;
use sd_transport::{CommandOutput, Transport, TransportError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const SERVER_DETAILS_FILE: &str = "server_details.json";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("writing artifacts to {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact listing did not include {SERVER_DETAILS_FILE}")]
    MissingServerDetails,
}

pub(crate) fn remote_staging_dir(base: &str, kind: TransportKind, ts: DateTime<Utc>) -> String {
    let stamp = ts.timestamp_millis();
    match kind {
        TransportKind::Ssh => format!("{}/sd-probe-{stamp}", base.trim_end_matches('/')),
        TransportKind::Winrm => format!("{}\\sd-probe-{stamp}", base.trim_end_matches('\\')),
    }
}

pub(crate) fn local_artifact_dir(out_dir: &Path, hostname: &str, ts: DateTime<Utc>) -> PathBuf {
    out_dir.join(format!("{hostname}_{}", ts.timestamp_millis()))
}

/// Creates the per-run remote directory and places the probe script in it.
/// Linux targets get an executable file; Windows targets get the script
/// written via `WinrmTransport::upload`'s inline base64 PowerShell writer.
pub(crate) async fn stage(
    transport: &mut dyn Transport,
    kind: TransportKind,
    remote_dir: &str,
    probe: &ProbeSpec,
) -> Result<(), TransportError> {
    match kind {
        TransportKind::Ssh => {
            let out = transport
                .exec(&format!("mkdir -p '{remote_dir}'"), None, Duration::from_secs(30))
                .await?;
            require_success(&out, "mkdir")?;
            transport
                .upload(&format!("{remote_dir}/probe.sh"), &probe.linux_script)
                .await
        }
        TransportKind::Winrm => {
            let mkdir = format!(
                "powershell -NoProfile -Command \"New-Item -ItemType Directory -Force -Path '{remote_dir}' | Out-Null\""
            );
            let out = transport.exec(&mkdir, None, Duration::from_secs(30)).await?;
            require_success(&out, "directory creation")?;
            transport
                .upload(&format!("{remote_dir}\\probe.ps1"), &probe.windows_script)
                .await
        }
    }
}

/// Runs the staged probe with the per-run directory as the working
/// directory (Linux) or an explicit `-OutDir` argument (Windows).
pub(crate) async fn execute(
    transport: &mut dyn Transport,
    kind: TransportKind,
    remote_dir: &str,
    timeout: Duration,
) -> Result<CommandOutput, TransportError> {
    let cmd = match kind {
        TransportKind::Ssh => format!("cd '{remote_dir}' && ./probe.sh"),
        TransportKind::Winrm => format!(
            "powershell -NoProfile -ExecutionPolicy Bypass -File \"{remote_dir}\\probe.ps1\" -OutDir \"{remote_dir}\""
        ),
    };
    transport.exec(&cmd, None, timeout).await
}

/// Lists the remote artifact directory and downloads each file into
/// `local_dir`. A download failure for any one file is recorded as a
/// warning rather than aborting the fetch; the fetch only fails outright
/// if `server_details.json` itself could not be obtained.
pub(crate) async fn fetch(
    transport: &mut dyn Transport,
    kind: TransportKind,
    remote_dir: &str,
    local_dir: &Path,
) -> Result<(Vec<u8>, Vec<String>), FetchError> {
    let list_cmd = match kind {
        TransportKind::Ssh => format!("ls -1 '{remote_dir}'"),
        TransportKind::Winrm => {
            format!("powershell -NoProfile -Command \"Get-ChildItem -Name '{remote_dir}'\"")
        }
    };
    let listing = transport.exec(&list_cmd, None, Duration::from_secs(30)).await?;
    let names: Vec<String> = String::from_utf8_lossy(&listing.stdout)
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    std::fs::create_dir_all(local_dir)?;

    let mut warnings = Vec::new();
    let mut server_details = None;
    for name in names {
        let remote_path = match kind {
            TransportKind::Ssh => format!("{remote_dir}/{name}"),
            TransportKind::Winrm => format!("{remote_dir}\\{name}"),
        };
        match transport.download(&remote_path).await {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(local_dir.join(&name), &bytes) {
                    warnings.push(format!("writing {name} to {}: {e}", local_dir.display()));
                    continue;
                }
                if name == SERVER_DETAILS_FILE {
                    server_details = Some(bytes);
                }
            }
            Err(e) => warnings.push(format!("downloading {name}: {e}")),
        }
    }

    server_details
        .map(|bytes| (bytes, warnings))
        .ok_or(FetchError::MissingServerDetails)
}

/// Removes the per-run remote directory. Errors are swallowed: cleanup is
/// best-effort, never a reason to fail an otherwise-successful Discovery.
pub(crate) async fn best_effort_cleanup(transport: &mut dyn Transport, kind: TransportKind, remote_dir: &str) {
    let cmd = match kind {
        TransportKind::Ssh => format!("rm -rf '{remote_dir}'"),
        TransportKind::Winrm => {
            format!("powershell -NoProfile -Command \"Remove-Item -Recurse -Force '{remote_dir}'\"")
        }
    };
    let _ = transport.exec(&cmd, None, Duration::from_secs(30)).await;
}

fn require_success(output: &CommandOutput, what: &str) -> Result<(), TransportError> {
    if output.success() {
        Ok(())
    } else {
        Err(TransportError::UploadFailed(format!(
            "{what} exited {}: {}",
            output.exit_code,
            String::from_utf8_lossy(&output.stderr)
        )))
    }
}

#[cfg(test)]
#[path = "stages_tests.rs"]
mod tests;
