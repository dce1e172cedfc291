//! Error formatting tests
//!
//! Display output must carry the context needed to diagnose a rejected tag or frame.

use codec::{DecodeError, EncodeError, OptionError, StateError};

#[test]
fn test_state_error_formatting() {
    let display = StateError::InvalidNameChar { ch: '!', position: 8 }.to_string();
    assert!(display.contains("'!'"));
    assert!(display.contains("at 8"));

    let display = StateError::NameTooLong { len: 256, max: 255 }.to_string();
    assert!(display.contains("256 bytes"));
    assert!(display.contains("maximum 255"));

    let display = StateError::ValueTooLarge { size: 5000, max: 4095 }.to_string();
    assert!(display.contains("5000"));
    assert!(display.contains("4095"));
}

#[test]
fn test_signature_error_renders_hex() {
    let error = DecodeError::invalid_signature(&[0x1b, 0x4e, 0x53, 0x51], b"GET ");
    let display = error.to_string();
    assert!(display.contains("1b4e5351"));
    assert!(display.contains("47455420"));

    let debug = format!("{:?}", error);
    assert!(debug.contains("InvalidSignature"));
}

#[test]
fn test_truncated_error_formatting() {
    let display = DecodeError::truncated(7, 2, 1, "tag block size").to_string();
    assert!(display.contains("need 2 bytes"));
    assert!(display.contains("offset 7"));
    assert!(display.contains("1 available"));
    assert!(display.contains("tag block size"));
}

#[test]
fn test_version_error_formatting() {
    let display = DecodeError::UnsupportedVersion {
        version: 2,
        supported: 1,
    }
    .to_string();
    assert!(display.contains("0x02"));
    assert!(display.contains("0x01"));
}

#[test]
fn test_invalid_tag_keeps_source() {
    use std::error::Error;

    let error = DecodeError::InvalidTag {
        offset: 11,
        source: StateError::EmptyName,
    };
    assert!(error.source().is_some());
    assert!(error.to_string().contains("offset 11"));
}

#[test]
fn test_unenveloped_classification() {
    assert!(DecodeError::invalid_signature(&[1], &[2]).is_unenveloped());
    assert!(DecodeError::truncated(0, 4, 2, "signature").is_unenveloped());
    assert!(!DecodeError::truncated(9, 2, 0, "state end delimiter").is_unenveloped());
    assert!(!DecodeError::MissingSeparator { offset: 11 }.is_unenveloped());
}

#[test]
fn test_encode_and_option_error_formatting() {
    let display = EncodeError::TagBlockTooLarge {
        size: 70000,
        max: 65535,
        tag_count: 17,
    }
    .to_string();
    assert!(display.contains("70000"));
    assert!(display.contains("17 tags"));

    let display = OptionError::failed("trace_propagation", "no propagator").to_string();
    assert!(display.contains("trace_propagation"));
    assert!(display.contains("no propagator"));

    let display = OptionError::from(StateError::EmptyName).to_string();
    assert!(display.contains("name is empty"));
}
