//! Tests requiring a real XBee module.
//!
//! These tests are ignored by default and compiled only with the
//! `hardware-tests` feature.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export XBEE_TEST_PORT=/dev/ttyUSB0     # module attached here
//! export XBEE_TEST_BAUD=9600             # optional, default: 9600
//!
//! cargo test --features hardware-tests -- --ignored
//! ```

#![cfg(all(unix, feature = "hardware-tests"))]

use std::env;
use std::time::Duration;
use xbee_serial::port::{BaudRate, PortConfig, PortSession};
use xbee_serial::protocol::{CommandMode, ProtocolState};

/// Get the test port from environment variable.
fn get_test_port() -> Option<String> {
    let port = env::var("XBEE_TEST_PORT").ok();
    if port.is_none() {
        println!("Skipping hardware test: XBEE_TEST_PORT not set");
    }
    port
}

fn test_config() -> PortConfig {
    let baud = env::var("XBEE_TEST_BAUD")
        .ok()
        .and_then(|s| s.parse().ok())
        .and_then(|b: u32| BaudRate::try_from(b).ok())
        .unwrap_or(BaudRate::B9600);

    PortConfig {
        baud_rate: baud,
        // Modules need about a second of silence around the guard sequence.
        guard_silence: Duration::from_millis(1100),
        ..PortConfig::default()
    }
}

#[test]
#[ignore] // Run with --ignored flag
fn test_real_open_and_restore() {
    let Some(path) = get_test_port() else {
        return;
    };

    let mut session = PortSession::open(&path, test_config()).expect("open test port");
    assert!(session.is_open());
    assert!(session.handle().is_some());

    session.close_and_restore();
    assert!(!session.is_open());

    // The saved discipline was restored, so the device can be opened again.
    let again = PortSession::open(&path, test_config()).expect("reopen test port");
    drop(again);
}

#[test]
#[ignore]
fn test_real_enter_and_exit() {
    let Some(path) = get_test_port() else {
        return;
    };

    let mut session = PortSession::open(&path, test_config()).expect("open test port");
    let mut protocol = CommandMode::for_session(&session);

    protocol.enter_command_mode(&mut session).expect("enter command mode");
    assert_eq!(protocol.state(), ProtocolState::CommandMode);

    protocol.exit_command_mode(&mut session).expect("exit command mode");
    assert_eq!(protocol.state(), ProtocolState::Idle);
}

#[test]
#[ignore]
fn test_real_network_address() {
    let Some(path) = get_test_port() else {
        return;
    };

    let mut session = PortSession::open(&path, test_config()).expect("open test port");
    let mut protocol = CommandMode::for_session(&session);

    let address = protocol
        .network_address(&mut session)
        .expect("query ATMY");
    println!("Module address: {}", address);

    assert!(!address.is_empty());
    assert!(address.as_bytes().iter().all(u8::is_ascii_hexdigit));
    assert_eq!(protocol.state(), ProtocolState::Idle);
}
