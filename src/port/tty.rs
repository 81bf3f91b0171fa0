//! TTY serial port implementation.
//!
//! Opens the device non-blocking and without becoming its controlling
//! terminal, saves the current termios block and applies a raw 8N1 line
//! discipline. The saved block is written back when the port is closed.

use super::error::{ConfigStep, PortError};
use super::traits::{PortConfig, SerialPortAdapter};
use crate::readiness::Handle;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

/// Serial port backed by a TTY device node.
pub struct TtyPort {
    /// Open device, `None` once closed.
    file: Option<File>,
    /// Attributes in force before this session configured the port.
    saved: Option<libc::termios>,
    /// The port name/path for identification.
    name: String,
}

impl TtyPort {
    /// Open and configure a TTY device.
    ///
    /// # Example
    /// ```no_run
    /// use xbee_serial::port::{PortConfig, TtyPort};
    ///
    /// let port = TtyPort::open("/dev/ttyUSB0", &PortConfig::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, config: &PortConfig) -> Result<Self, PortError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| PortError::Open {
                path: path.to_string(),
                source,
            })?;

        let mut port = Self {
            file: Some(file),
            saved: None,
            name: path.to_string(),
        };
        // On failure `port` drops here, restoring whatever was saved and closing the fd.
        port.configure(config)?;
        Ok(port)
    }

    fn configure(&mut self, config: &PortConfig) -> Result<(), PortError> {
        let fd = self.raw_fd().ok_or(PortError::Closed)?;

        // SAFETY: termios is a plain C struct; all-zero is a valid value to be overwritten.
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: `fd` is open for the lifetime of `self.file` and `saved` is a valid out-pointer.
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(step_error(ConfigStep::SaveAttributes));
        }
        self.saved = Some(saved);
        debug!(port = %self.name, "saved previous line discipline");

        let attrs = line_discipline(config)
            .map_err(|e| PortError::configuration(ConfigStep::SetBaudRate, e))?;

        // SAFETY: `fd` is open.
        if unsafe { libc::tcflush(fd, libc::TCIFLUSH) } != 0 {
            return Err(step_error(ConfigStep::FlushInput));
        }

        // SAFETY: `fd` is open and `attrs` is fully initialized.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &attrs) } != 0 {
            return Err(step_error(ConfigStep::ApplyAttributes));
        }

        debug!(
            port = %self.name,
            baud = %config.baud_rate,
            icrnl = config.translate_cr_to_nl,
            "applied raw line discipline"
        );
        Ok(())
    }

    fn raw_fd(&self) -> Option<Handle> {
        self.file.as_ref().map(|f| f.as_raw_fd())
    }
}

fn step_error(step: ConfigStep) -> PortError {
    PortError::configuration(step, io::Error::last_os_error())
}

/// Build the termios block for a session.
///
/// 8 data bits, receiver on, modem lines ignored, parity and framing errors
/// ignored, no output processing, no canonical editing, echo or signal
/// characters. `VMIN = 0, VTIME = 1`: a read returns with whatever is
/// available, or after 0.1 s.
pub fn line_discipline(config: &PortConfig) -> io::Result<libc::termios> {
    // SAFETY: termios is a plain C struct; all-zero is the cleared state.
    let mut attrs: libc::termios = unsafe { std::mem::zeroed() };

    attrs.c_cflag = libc::CS8 | libc::CLOCAL | libc::CREAD;
    attrs.c_iflag = libc::IGNPAR;
    if config.translate_cr_to_nl {
        attrs.c_iflag |= libc::ICRNL;
    }
    attrs.c_oflag = 0;
    attrs.c_lflag = 0;
    attrs.c_cc[libc::VMIN] = 0;
    attrs.c_cc[libc::VTIME] = 1;

    let speed = config.baud_rate.speed();
    // SAFETY: `attrs` is a valid termios block.
    if unsafe { libc::cfsetispeed(&mut attrs, speed) } != 0
        || unsafe { libc::cfsetospeed(&mut attrs, speed) } != 0
    {
        return Err(io::Error::last_os_error());
    }

    Ok(attrs)
}

impl SerialPortAdapter for TtyPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let file = self.file.as_mut().ok_or(PortError::Closed)?;
        file.write(data).map_err(PortError::WriteFailed)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let file = self.file.as_mut().ok_or(PortError::Closed)?;
        let mut byte = [0u8; 1];
        match file.read(&mut byte) {
            Ok(0) => Err(PortError::Disconnected),
            Ok(_) => Ok(Some(byte[0])),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self) -> Option<Handle> {
        self.raw_fd()
    }

    fn close(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        if let Some(saved) = self.saved.take() {
            // SAFETY: `file` is still open here and `saved` came from tcgetattr.
            if unsafe { libc::tcsetattr(file.as_raw_fd(), libc::TCSANOW, &saved) } != 0 {
                warn!(
                    port = %self.name,
                    error = %io::Error::last_os_error(),
                    "failed to restore previous line discipline"
                );
            }
        }
        drop(file);
        debug!(port = %self.name, "closed serial port");
    }
}

impl Drop for TtyPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TtyPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyPort")
            .field("name", &self.name)
            .field("fd", &self.raw_fd())
            .field("restore_pending", &self.saved.is_some())
            .finish()
    }
}
