// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sd_transport::fake::ExecScript;
use sd_transport::{CommandOutput, FakeTransport, TransportCall};

fn probe() -> ProbeSpec {
    ProbeSpec {
        linux_script: b"#!/bin/sh\necho hi\n".to_vec(),
        windows_script: b"Write-Output 'hi'\n".to_vec(),
    }
}

#[tokio::test]
async fn stage_ssh_creates_directory_and_uploads_executable_script() {
    let mut transport = FakeTransport::new();
    stage(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", &probe())
        .await
        .unwrap();

    let calls = transport.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, TransportCall::Exec { cmd } if cmd == "mkdir -p '/tmp/sd-probe-1'")));
    assert!(calls
        .iter()
        .any(|c| matches!(c, TransportCall::Upload { path, .. } if path == "/tmp/sd-probe-1/probe.sh")));
}

#[tokio::test]
async fn stage_winrm_creates_directory_and_uploads_script() {
    let mut transport = FakeTransport::new();
    stage(&mut transport, TransportKind::Winrm, "C:\\Windows\\Temp\\sd-probe-1", &probe())
        .await
        .unwrap();

    let calls = transport.calls();
    assert!(calls.iter().any(|c| matches!(c, TransportCall::Upload { path, .. }
        if path == "C:\\Windows\\Temp\\sd-probe-1\\probe.ps1")));
}

#[tokio::test]
async fn stage_propagates_mkdir_failure() {
    let transport = FakeTransport::new();
    transport.script_exec(
        "mkdir -p '/tmp/sd-probe-1'",
        ExecScript::Output(CommandOutput {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: b"permission denied".to_vec(),
        }),
    );
    let mut transport = transport;
    let err = stage(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", &probe())
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::UploadFailed(_)));
}

#[tokio::test]
async fn execute_ssh_builds_cd_and_run_command() {
    let mut transport = FakeTransport::new();
    execute(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", Duration::from_secs(5))
        .await
        .unwrap();
    let calls = transport.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, TransportCall::Exec { cmd } if cmd == "cd '/tmp/sd-probe-1' && ./probe.sh")));
}

#[tokio::test]
async fn fetch_downloads_listed_files_and_returns_server_details_bytes() {
    let transport = FakeTransport::new();
    transport.seed_file("/tmp/sd-probe-1/server_details.json", b"{\"hostname\":\"h\"}".to_vec());
    transport.seed_file("/tmp/sd-probe-1/extra.log", b"log line".to_vec());
    transport.script_exec(
        "ls -1 '/tmp/sd-probe-1'",
        ExecScript::Output(CommandOutput {
            exit_code: 0,
            stdout: b"server_details.json\nextra.log\n".to_vec(),
            stderr: Vec::new(),
        }),
    );
    let mut transport = transport;
    let local = tempfile::tempdir().unwrap();

    let (bytes, warnings) = fetch(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", local.path())
        .await
        .unwrap();

    assert_eq!(bytes, b"{\"hostname\":\"h\"}");
    assert!(warnings.is_empty());
    assert_eq!(
        std::fs::read(local.path().join("extra.log")).unwrap(),
        b"log line"
    );
}

#[tokio::test]
async fn fetch_collects_warning_for_missing_file_but_still_succeeds() {
    let transport = FakeTransport::new();
    transport.seed_file("/tmp/sd-probe-1/server_details.json", b"{}".to_vec());
    transport.script_exec(
        "ls -1 '/tmp/sd-probe-1'",
        ExecScript::Output(CommandOutput {
            exit_code: 0,
            stdout: b"server_details.json\nmissing.log\n".to_vec(),
            stderr: Vec::new(),
        }),
    );
    let mut transport = transport;
    let local = tempfile::tempdir().unwrap();

    let (bytes, warnings) = fetch(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", local.path())
        .await
        .unwrap();

    assert_eq!(bytes, b"{}");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("missing.log"));
}

#[tokio::test]
async fn fetch_fails_when_server_details_missing() {
    let transport = FakeTransport::new();
    transport.script_exec(
        "ls -1 '/tmp/sd-probe-1'",
        ExecScript::Output(CommandOutput {
            exit_code: 0,
            stdout: b"extra.log\n".to_vec(),
            stderr: Vec::new(),
        }),
    );
    transport.seed_file("/tmp/sd-probe-1/extra.log", b"log".to_vec());
    let mut transport = transport;
    let local = tempfile::tempdir().unwrap();

    let err = fetch(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1", local.path())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MissingServerDetails));
}

#[tokio::test]
async fn best_effort_cleanup_swallows_errors() {
    let transport = FakeTransport::new();
    transport.script_exec(
        "rm -rf '/tmp/sd-probe-1'",
        ExecScript::Fail(std::sync::Arc::new(|| {
            TransportError::StreamEof("gone".to_string())
        })),
    );
    let mut transport = transport;
    best_effort_cleanup(&mut transport, TransportKind::Ssh, "/tmp/sd-probe-1").await;
    assert_eq!(transport.exec_count(), 1);
}

#[test]
fn remote_staging_dir_uses_platform_separator() {
    let ts = DateTime::<Utc>::UNIX_EPOCH;
    assert_eq!(remote_staging_dir("/tmp/", TransportKind::Ssh, ts), "/tmp/sd-probe-0");
    assert_eq!(
        remote_staging_dir("C:\\Windows\\Temp\\", TransportKind::Winrm, ts),
        "C:\\Windows\\Temp\\sd-probe-0"
    );
}
