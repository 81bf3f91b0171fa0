//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates an XBee on the far end of the
//! line without requiring hardware. Replies can be scripted per request,
//! writes are logged, and faults (failed writes, hang-ups) can be injected.
//! The paired `MockMultiplexer` reports readiness from the same shared state.

use super::error::PortError;
use super::session::PortSession;
use super::traits::{PortConfig, SerialPortAdapter};
use crate::readiness::{Handle, Multiplexer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Handle reported by mock ports unless overridden.
pub const MOCK_HANDLE: Handle = 1000;

/// A scripted request/response pair.
#[derive(Debug, Clone)]
struct Exchange {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// Inner state of the mock port, shared with its multiplexer.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes accepted by write operations.
    write_log: Vec<Vec<u8>>,
    /// Scripted replies, matched by exact request bytes.
    exchanges: Vec<Exchange>,
    /// Expected write operations, checked in order.
    expected_writes: VecDeque<Vec<u8>>,
    /// Echo every accepted write back into the read queue.
    echo: bool,
    /// Zero-based indices of write calls that should fail.
    failing_writes: Vec<usize>,
    /// Number of write calls attempted so far.
    write_calls: usize,
    /// Reads report end-of-file once set.
    disconnected: bool,
    /// Whether `close` has released the port.
    closed: bool,
    /// How many times the port was actually released.
    close_count: usize,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// session owns another.
///
/// # Example
/// ```
/// use xbee_serial::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.respond_to(b"+++", b"OK\r");
///
/// port.write_bytes(b"+++").unwrap();
/// assert_eq!(port.read_byte().unwrap(), Some(b'O'));
/// assert_eq!(port.get_write_log(), vec![b"+++".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// Handle reported to the multiplexer.
    handle: Handle,
    /// The internal state, shared with clones and the multiplexer.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: MOCK_HANDLE,
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Reply with `response` the first time `request` is written.
    ///
    /// Writes with no scripted reply get no answer, like a module ignoring noise.
    pub fn respond_to(&mut self, request: &[u8], response: &[u8]) {
        self.state.lock().exchanges.push(Exchange {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Expect a specific write operation.
    ///
    /// A write that differs from the next expectation fails.
    pub fn expect_write(&mut self, data: &[u8]) {
        self.state.lock().expected_writes.push_back(data.to_vec());
    }

    /// Verify that all expected writes have occurred in order.
    pub fn verify_expectations(&self) -> Result<(), String> {
        let state = self.state.lock();
        if !state.expected_writes.is_empty() {
            return Err(format!(
                "Expected {} more write(s), but none occurred",
                state.expected_writes.len()
            ));
        }
        Ok(())
    }

    /// Echo every accepted write back to the reader.
    pub fn set_echo(&mut self, echo: bool) {
        self.state.lock().echo = echo;
    }

    /// Make the `index`-th write call (zero-based) fail.
    pub fn fail_write(&mut self, index: usize) {
        self.state.lock().failing_writes.push(index);
    }

    /// Simulate the peer hanging up.
    pub fn disconnect(&mut self) {
        self.state.lock().disconnected = true;
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Clear the write log.
    pub fn clear_write_log(&mut self) {
        self.state.lock().write_log.clear();
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// How many times the port was released.
    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    /// Build a multiplexer that reports readiness from this port's state.
    pub fn multiplexer(&self) -> MockMultiplexer {
        MockMultiplexer {
            handle: self.handle,
            state: Arc::clone(&self.state),
        }
    }

    /// Wrap a clone of this port and its multiplexer in a session.
    pub fn session(&self, config: PortConfig) -> PortSession {
        PortSession::from_parts(Box::new(self.clone()), Box::new(self.multiplexer()), config)
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(PortError::Closed);
        }

        let call = state.write_calls;
        state.write_calls += 1;
        if let Some(pos) = state.failing_writes.iter().position(|&i| i == call) {
            state.failing_writes.remove(pos);
            return Err(PortError::WriteFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }

        if let Some(expected) = state.expected_writes.pop_front() {
            if expected != data {
                return Err(PortError::WriteFailed(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Expected write: {:?}, got: {:?}", expected, data),
                )));
            }
        }

        state.write_log.push(data.to_vec());

        if state.echo {
            state.read_queue.extend(data);
        }
        if let Some(pos) = state.exchanges.iter().position(|e| e.request == data) {
            let exchange = state.exchanges.remove(pos);
            state.read_queue.extend(exchange.response);
        }

        Ok(data.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(PortError::Closed);
        }
        if let Some(byte) = state.read_queue.pop_front() {
            return Ok(Some(byte));
        }
        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self) -> Option<Handle> {
        if self.state.lock().closed {
            None
        } else {
            Some(self.handle)
        }
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            state.close_count += 1;
        }
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Multiplexer reporting a mock port's handle ready whenever it has input.
///
/// Other handles are never ready. When nothing is ready it sleeps for the
/// timeout, like a real poll.
#[derive(Debug)]
pub struct MockMultiplexer {
    handle: Handle,
    state: Arc<Mutex<MockPortState>>,
}

impl Multiplexer for MockMultiplexer {
    fn wait_ready_set(&mut self, handles: &[Handle], timeout: Duration) -> io::Result<Vec<Handle>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let readable = {
            let state = self.state.lock();
            !state.closed && (!state.read_queue.is_empty() || state.disconnected)
        };

        if readable && handles.contains(&self.handle) {
            return Ok(vec![self.handle]);
        }

        std::thread::sleep(timeout);
        Ok(Vec::new())
    }
}
