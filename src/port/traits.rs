//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows both the real TTY and a
//! scripted mock peer to be driven by the same session and protocol code.

use super::error::PortError;
use crate::readiness::{Handle, PollTimeout};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fixed capacity of a response line, in bytes.
pub const MAX_BUFFER_SIZE: usize = 255;

/// Overall deadline applied to a single response unless configured otherwise.
pub const DEFAULT_RESPONSE_DEADLINE: Duration = Duration::from_secs(5);

/// Line-discipline and timing parameters for a port session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Symbolic line speed.
    pub baud_rate: BaudRate,

    /// Bounded wait of each readiness poll.
    pub poll_timeout: PollTimeout,

    /// Overall deadline for one response line; `None` waits forever.
    pub response_deadline: Option<Duration>,

    /// Longest response line accepted before a carriage return.
    pub max_line_len: usize,

    /// Ask the OS to translate incoming CR to NL (`ICRNL`).
    ///
    /// Off by default: with translation on, the CR delimiter never reaches
    /// the line reader.
    pub translate_cr_to_nl: bool,

    /// Quiet period observed before the guard sequence is written.
    pub guard_silence: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::B9600,
            poll_timeout: PollTimeout::default(),
            response_deadline: Some(DEFAULT_RESPONSE_DEADLINE),
            max_line_len: MAX_BUFFER_SIZE,
            translate_cr_to_nl: false,
            guard_silence: Duration::ZERO,
        }
    }
}

/// Supported line speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B1200,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    pub const ALL: [BaudRate; 9] = [
        Self::B1200,
        Self::B2400,
        Self::B4800,
        Self::B9600,
        Self::B19200,
        Self::B38400,
        Self::B57600,
        Self::B115200,
        Self::B230400,
    ];

    /// Bits per second.
    pub fn bits_per_second(self) -> u32 {
        match self {
            Self::B1200 => 1200,
            Self::B2400 => 2400,
            Self::B4800 => 4800,
            Self::B9600 => 9600,
            Self::B19200 => 19200,
            Self::B38400 => 38400,
            Self::B57600 => 57600,
            Self::B115200 => 115200,
            Self::B230400 => 230400,
        }
    }

    /// The termios speed constant for this rate.
    #[cfg(unix)]
    pub fn speed(self) -> libc::speed_t {
        match self {
            Self::B1200 => libc::B1200,
            Self::B2400 => libc::B2400,
            Self::B4800 => libc::B4800,
            Self::B9600 => libc::B9600,
            Self::B19200 => libc::B19200,
            Self::B38400 => libc::B38400,
            Self::B57600 => libc::B57600,
            Self::B115200 => libc::B115200,
            Self::B230400 => libc::B230400,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|rate| rate.bits_per_second() == value)
            .ok_or_else(|| format!("unsupported baud rate {value}"))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bits_per_second()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

/// Trait for byte-level serial I/O.
///
/// This trait abstracts over the real TTY and mock implementations. Reads are
/// non-blocking: callers confirm readiness through a
/// [`Multiplexer`](crate::readiness::Multiplexer) first.
pub trait SerialPortAdapter: Send + fmt::Debug {
    /// Write bytes with a single write call.
    ///
    /// Returns the number of bytes the OS accepted, which may be short.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read at most one byte.
    ///
    /// Returns `Ok(None)` if no byte is currently available and
    /// `Err(PortError::Disconnected)` on end-of-file.
    fn read_byte(&mut self) -> Result<Option<u8>, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// The handle to watch for readability, or `None` once closed.
    fn handle(&self) -> Option<Handle>;

    /// Restore the saved line discipline and release the handle.
    ///
    /// Must be idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool {
        self.handle().is_some()
    }
}
