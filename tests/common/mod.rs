//! Shared test utilities for xbee_serial integration tests.
//!
//! This module provides common test infrastructure including:
//! - A scripted XBee peer built on `MockSerialPort`
//! - A session configuration with short waits
//! - Helpers for decoding the write log

#![allow(dead_code)]

use std::time::Duration;
use xbee_serial::port::{MockSerialPort, PortConfig, PortSession};

/// Session configuration with a short response deadline so timeouts stay fast.
pub fn fast_config() -> PortConfig {
    PortConfig {
        response_deadline: Some(Duration::from_millis(100)),
        ..PortConfig::default()
    }
}

/// Create a peer that answers the guard sequence and `atcn` with `OK`.
///
/// # Example
/// ```ignore
/// let peer = xbee_peer("MOCK0", &[(b"ATMY\r", b"1A2B\r")]);
/// ```
pub fn xbee_peer(port_name: &str, exchanges: &[(&[u8], &[u8])]) -> MockSerialPort {
    let mut peer = MockSerialPort::new(port_name);
    peer.respond_to(b"+++", b"OK\r");
    for (request, response) in exchanges {
        peer.respond_to(request, response);
    }
    peer.respond_to(b"atcn\r", b"OK\r");
    peer
}

/// Open a mock session over `peer` with [`fast_config`].
pub fn fast_session(peer: &MockSerialPort) -> PortSession {
    peer.session(fast_config())
}

/// The peer's write log as lossy strings, for readable assertions.
pub fn written(peer: &MockSerialPort) -> Vec<String> {
    peer.get_write_log()
        .iter()
        .map(|w| String::from_utf8_lossy(w).into_owned())
        .collect()
}
