// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knobs the orchestrator needs that don't belong on a per-Target basis.

use std::path::PathBuf;
use std::time::Duration;

/// The probe payload staged onto a target. Treated as an opaque byte blob —
/// this system does not author or validate what the script does, only that
/// its stdout (captured via `exec`) succeeds and that it leaves a
/// `server_details.json` behind in its working directory.
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    /// Shell script uploaded and chmod'd executable on SSH targets.
    pub linux_script: Vec<u8>,
    /// PowerShell source, base64-inlined by `WinrmTransport::upload` and
    /// invoked with `-File` against WinRM targets.
    pub windows_script: Vec<u8>,
}

/// Orchestrator-wide configuration shared across every Target it probes.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Parent directory for the per-run remote staging directory, e.g.
    /// `/tmp` for SSH targets or `C:\Windows\Temp` for WinRM targets.
    pub remote_base_dir: String,
    /// Local root under which `<hostname>_<timestamp>/` artifact
    /// directories are created.
    pub out_dir: PathBuf,
    /// Deadline applied to the probe's `exec` call when the Target doesn't
    /// override it.
    pub probe_timeout: Duration,
    pub probe: ProbeSpec,
}
