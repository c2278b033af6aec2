// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sd_core::Credential;
use std::time::Duration;

#[tokio::test]
async fn connect_refused_when_nothing_is_listening() {
    // Port 1 on localhost never accepts connections in this sandbox; this
    // exercises the dial path and its error classification without a real
    // SSH server.
    let credential = Credential {
        username: "probe".to_string(),
        password: Some("probe".to_string()),
        key_path: None,
    };
    let err = SshTransport::connect("127.0.0.1", 1, &credential, Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransportError::ConnectRefused(_) | TransportError::DeadlineExceeded(_)
    ));
}

#[tokio::test]
async fn connect_times_out_against_a_silent_listener() {
    // A bound-but-never-accepting listener simulates a host that drops the
    // handshake, forcing the connect_timeout path deterministically.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Immediately drop the listener's ability to accept by leaking the
    // socket into a background task that never calls accept().
    tokio::spawn(async move {
        let _keep_alive = listener;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let credential = Credential {
        username: "probe".to_string(),
        password: None,
        key_path: None,
    };
    let started = std::time::Instant::now();
    let result = SshTransport::connect(
        &addr.ip().to_string(),
        addr.port(),
        &credential,
        Duration::from_millis(300),
    )
    .await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
}
