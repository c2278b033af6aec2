// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::target::Credential;

#[test]
fn fingerprint_format_is_host_port_transport() {
    let fp = Fingerprint::new("host-a", 22, TransportKind::Ssh);
    assert_eq!(fp.as_str(), "host-a:22:ssh");
}

#[test]
fn for_target_derives_fingerprint_from_target_fields() {
    let target = Target::new(
        "t1",
        "host-b",
        TransportKind::Winrm,
        5985,
        Credential {
            username: "admin".to_string(),
            password: None,
            key_path: None,
        },
        "us-east",
    );
    assert_eq!(Fingerprint::for_target(&target).as_str(), "host-b:5985:winrm");
}

#[test]
fn distinct_transports_on_same_host_port_are_distinct_fingerprints() {
    let a = Fingerprint::new("host-a", 22, TransportKind::Ssh);
    let b = Fingerprint::new("host-a", 22, TransportKind::Winrm);
    assert_ne!(a, b);
}
