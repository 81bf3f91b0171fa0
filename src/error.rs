//! Unified application error type.
//!
//! Aggregates the per-layer errors so the command-line front ends can use `?`
//! across configuration, port and protocol code and still report a numeric
//! result code.

use crate::config::ConfigError;
use crate::port::PortError;
use crate::protocol::ProtocolError;
use crate::reader::ReadError;
use thiserror::Error;

/// A specialized `Result` type for front-end operations.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Operation requires an open port.
    #[error("no serial port is open")]
    PortNotOpen,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    /// Numeric result code for the presentation layer.
    pub fn code(&self) -> i32 {
        match self {
            Self::Port(e) => e.code(),
            Self::Read(e) => e.code(),
            Self::Protocol(e) => e.code(),
            Self::Config(_) => 10,
            Self::PortNotOpen => -5,
            Self::Io(_) | Self::Serde(_) => -6,
        }
    }

    /// Short kind name, e.g. `UnexpectedResponse`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationFile",
            Self::Port(e) => match e {
                PortError::InvalidPath { .. } => "InvalidPath",
                PortError::Open { .. } => "OpenError",
                PortError::Configuration { .. } => "ConfigurationError",
                PortError::WriteFailed(_) => "WriteFailed",
                PortError::Disconnected => "Disconnected",
                PortError::Closed => "Closed",
                PortError::Io(_) => "Io",
            },
            Self::Read(e) => read_kind(e),
            Self::Protocol(e) => match e {
                ProtocolError::WriteFailed { .. } => "WriteFailed",
                ProtocolError::Read { source, .. } => read_kind(source),
                ProtocolError::UnexpectedResponse { .. } => "UnexpectedResponse",
                ProtocolError::InvalidCommand(_) => "InvalidCommand",
            },
            Self::PortNotOpen => "PortNotOpen",
            Self::Io(_) => "Io",
            Self::Serde(_) => "Serialization",
        }
    }
}

fn read_kind(err: &ReadError) -> &'static str {
    match err {
        ReadError::Disconnected => "Disconnected",
        ReadError::Timeout(_) => "Timeout",
        ReadError::Overflow { .. } => "Overflow",
        ReadError::Poll(_) => "PollFailed",
    }
}
