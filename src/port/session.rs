//! Port session: the exclusive owner of one open serial handle.
//!
//! A session pairs a [`SerialPortAdapter`] with the [`Multiplexer`] used to
//! wait on it, plus the configuration it was opened with. Dropping a session
//! restores the saved line discipline and releases the handle.

use super::error::PortError;
use super::traits::{PortConfig, SerialPortAdapter, MAX_BUFFER_SIZE};
use crate::readiness::{Handle, Multiplexer};
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Device opened when an empty path is supplied.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Longest accepted device path, in bytes.
pub const MAX_PATH_LEN: usize = MAX_BUFFER_SIZE;

/// Validate a device path and substitute the default for an empty one.
///
/// Pure: never touches the OS.
pub fn resolve_path(path: &str) -> Result<&str, PortError> {
    if path.len() > MAX_PATH_LEN {
        return Err(PortError::InvalidPath {
            len: path.len(),
            max: MAX_PATH_LEN,
        });
    }
    if path.is_empty() {
        return Ok(DEFAULT_DEVICE);
    }
    Ok(path)
}

/// An open, configured serial port.
pub struct PortSession {
    port: Box<dyn SerialPortAdapter>,
    mux: Box<dyn Multiplexer>,
    config: PortConfig,
}

impl PortSession {
    /// Open and configure the device at `path`.
    ///
    /// An empty path opens [`DEFAULT_DEVICE`]. Paths longer than
    /// [`MAX_PATH_LEN`] are rejected before any OS call.
    #[cfg(unix)]
    pub fn open(path: &str, config: PortConfig) -> Result<Self, PortError> {
        let path = resolve_path(path)?;
        let port = super::tty::TtyPort::open(path, &config)?;
        info!(port = path, baud = %config.baud_rate, "established communication with device");
        Ok(Self::from_parts(
            Box::new(port),
            Box::new(crate::readiness::PollMultiplexer),
            config,
        ))
    }

    #[cfg(not(unix))]
    pub fn open(path: &str, _config: PortConfig) -> Result<Self, PortError> {
        let path = resolve_path(path)?;
        Err(PortError::Open {
            path: path.to_string(),
            source: io::Error::new(
                io::ErrorKind::Unsupported,
                "termios serial ports are only available on unix",
            ),
        })
    }

    /// Assemble a session from an already opened adapter and its multiplexer.
    pub fn from_parts(
        port: Box<dyn SerialPortAdapter>,
        mux: Box<dyn Multiplexer>,
        config: PortConfig,
    ) -> Self {
        Self { port, mux, config }
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        self.port.name()
    }

    /// Handle of the serial port, `None` after teardown.
    pub fn handle(&self) -> Option<Handle> {
        self.port.handle()
    }

    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }

    /// Write `bytes` with one write call; a short write is not retried.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, PortError> {
        let written = self.port.write_bytes(bytes)?;
        if written < bytes.len() {
            warn!(
                port = self.port.name(),
                written,
                requested = bytes.len(),
                "short write to serial port"
            );
        }
        debug!(port = self.port.name(), data = %bytes.escape_ascii(), "wrote");
        Ok(written)
    }

    /// Non-blocking single-byte read.
    pub fn read_one_byte(&mut self) -> Result<Option<u8>, PortError> {
        self.port.read_byte()
    }

    /// Wait up to the configured poll timeout for any of `handles` to be readable.
    pub fn wait_ready(&mut self, handles: &[Handle]) -> io::Result<usize> {
        self.mux
            .wait_ready(handles, self.config.poll_timeout.as_duration())
    }

    /// Wait up to `timeout` and return which of `handles` are readable.
    pub fn wait_ready_set(&mut self, handles: &[Handle], timeout: Duration) -> io::Result<Vec<Handle>> {
        self.mux.wait_ready_set(handles, timeout)
    }

    /// Restore the saved line discipline and release the handle.
    ///
    /// Idempotent; also runs on drop.
    pub fn close_and_restore(&mut self) {
        if self.port.is_open() {
            info!(port = self.port.name(), "closing serial port");
        }
        self.port.close();
    }
}

impl Drop for PortSession {
    fn drop(&mut self) {
        self.close_and_restore();
    }
}

impl std::fmt::Debug for PortSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSession")
            .field("port", &self.port)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    #[test]
    fn test_empty_path_uses_default_device() {
        assert_eq!(resolve_path("").unwrap(), "/dev/ttyUSB0");
        assert_eq!(resolve_path("/dev/ttyS1").unwrap(), "/dev/ttyS1");
    }

    #[test]
    fn test_path_length_limit() {
        let exact = "a".repeat(MAX_PATH_LEN);
        assert!(resolve_path(&exact).is_ok());

        let long = "a".repeat(MAX_PATH_LEN + 1);
        match resolve_path(&long) {
            Err(PortError::InvalidPath { len, max }) => {
                assert_eq!(len, 256);
                assert_eq!(max, 255);
            }
            other => panic!("Expected InvalidPath, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_rejects_long_path() {
        let long = format!("/dev/{}", "x".repeat(300));
        let err = PortSession::open(&long, PortConfig::default()).unwrap_err();
        assert!(matches!(err, PortError::InvalidPath { .. }));
    }

    #[test]
    fn test_close_and_restore_twice() {
        let peer = MockSerialPort::new("MOCK0");
        let mut session = peer.session(PortConfig::default());

        session.close_and_restore();
        session.close_and_restore();
        drop(session);

        assert_eq!(peer.close_count(), 1);
    }

    #[test]
    fn test_drop_releases_port() {
        let peer = MockSerialPort::new("MOCK0");
        {
            let session = peer.session(PortConfig::default());
            assert!(session.is_open());
        }
        assert_eq!(peer.close_count(), 1);
    }

    #[test]
    fn test_write_after_close_fails() {
        let peer = MockSerialPort::new("MOCK0");
        let mut session = peer.session(PortConfig::default());
        session.close_and_restore();

        assert!(matches!(session.write(b"+++"), Err(PortError::Closed)));
        assert_eq!(session.handle(), None);
    }
}
