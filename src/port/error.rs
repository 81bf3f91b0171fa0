//! Port-specific error types.
//!
//! Errors raised while opening, configuring and driving the serial handle.
//! Kept separate from the protocol errors so the session layer has no
//! knowledge of AT command semantics.

use std::fmt;
use std::io;
use thiserror::Error;

/// The line-discipline step that failed while configuring a freshly opened port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    /// Reading the current attributes so they can be restored on teardown.
    SaveAttributes,
    /// Applying the input/output speed to the attribute block.
    SetBaudRate,
    /// Discarding input that was received but not yet read.
    FlushInput,
    /// Writing the new attributes to the descriptor.
    ApplyAttributes,
}

impl ConfigStep {
    /// Numeric result code reported to the presentation layer.
    pub fn code(self) -> i32 {
        match self {
            Self::SaveAttributes => 3,
            Self::SetBaudRate => 4,
            Self::FlushInput => 5,
            Self::ApplyAttributes => 6,
        }
    }
}

impl fmt::Display for ConfigStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SaveAttributes => "save attributes",
            Self::SetBaudRate => "set baud rate",
            Self::FlushInput => "flush input",
            Self::ApplyAttributes => "apply attributes",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device path exceeds the fixed buffer size. No OS call was made.
    #[error("port name is {len} bytes long; at most {max} bytes are allowed")]
    InvalidPath { len: usize, max: usize },

    /// The OS refused to open the device.
    #[error("failed to open serial port '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Applying the line discipline failed at the given step.
    #[error("failed to configure serial port ({step}): {source}")]
    Configuration {
        step: ConfigStep,
        #[source]
        source: io::Error,
    },

    /// The write call reported an outright failure.
    #[error("write to serial port failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// The peer hung up: a read returned end-of-file.
    #[error("serial port disconnected")]
    Disconnected,

    /// The session was already closed.
    #[error("serial port is closed")]
    Closed,

    /// Any other I/O error on the handle.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PortError {
    /// Create a Configuration error for a failed step.
    pub fn configuration(step: ConfigStep, source: io::Error) -> Self {
        Self::Configuration { step, source }
    }

    /// Numeric result code reported to the presentation layer.
    ///
    /// Open failures keep the historical `1..=6` codes; runtime failures are negative.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidPath { .. } => 1,
            Self::Open { .. } => 2,
            Self::Configuration { step, .. } => step.code(),
            Self::WriteFailed(_) => -1,
            Self::Disconnected => -2,
            Self::Closed => -5,
            Self::Io(_) => -6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::InvalidPath { len: 300, max: 255 };
        assert_eq!(
            err.to_string(),
            "port name is 300 bytes long; at most 255 bytes are allowed"
        );

        let err = PortError::configuration(
            ConfigStep::FlushInput,
            io::Error::new(io::ErrorKind::Other, "boom"),
        );
        assert_eq!(
            err.to_string(),
            "failed to configure serial port (flush input): boom"
        );

        assert_eq!(PortError::Closed.to_string(), "serial port is closed");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(PortError::InvalidPath { len: 256, max: 255 }.code(), 1);
        let open = PortError::Open {
            path: "/dev/ttyUSB9".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(open.code(), 2);
        for (step, code) in [
            (ConfigStep::SaveAttributes, 3),
            (ConfigStep::SetBaudRate, 4),
            (ConfigStep::FlushInput, 5),
            (ConfigStep::ApplyAttributes, 6),
        ] {
            let err = PortError::configuration(step, io::Error::from(io::ErrorKind::Other));
            assert_eq!(err.code(), code);
        }
    }
}
