// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn extract_tag_pulls_inner_text() {
    let xml = "<s:Body><w:Selector Name=\"ShellId\">67A74734-0000</w:Selector></s:Body>";
    let id = extract_tag(xml, "w:Selector Name=\"ShellId\"").unwrap();
    assert_eq!(id, "67A74734-0000");
}

#[test]
fn extract_tag_missing_returns_none() {
    let xml = "<s:Body></s:Body>";
    assert!(extract_tag(xml, "rsp:ShellId").is_none());
}

#[test]
fn extract_all_tags_finds_every_occurrence() {
    let xml = "<rsp:Stream Name=\"stdout\">aGk=</rsp:Stream><rsp:Stream Name=\"stderr\">b28=</rsp:Stream>";
    let streams = extract_all_tags(xml, "rsp:Stream");
    assert_eq!(streams.len(), 2);
    assert!(streams[0].contains("stdout"));
    assert!(streams[1].contains("stderr"));
}

#[test]
fn extract_attr_reads_exit_code() {
    let xml = "<rsp:CommandState State=\"Done\" ExitCode=\"1\"/>";
    assert_eq!(extract_attr(xml, "ExitCode").unwrap(), "1");
}

#[test]
fn decode_stream_into_appends_base64_payload() {
    let tag = "<rsp:Stream Name=\"stdout\">aGVsbG8=</rsp:Stream>";
    let mut out = Vec::new();
    decode_stream_into(tag, &mut out);
    assert_eq!(out, b"hello");
}

#[test]
fn xml_escape_handles_reserved_characters() {
    assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
}

#[test]
fn soap_envelope_carries_action_and_body() {
    let envelope = soap_envelope("urn:action", "http://host:5985/wsman", "<x/>");
    assert!(envelope.contains("<a:Action>urn:action</a:Action>"));
    assert!(envelope.contains("<x/>"));
}
