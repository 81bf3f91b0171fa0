//! Protocol error types.

use crate::port::PortError;
use crate::reader::ReadError;
use thiserror::Error;

/// Errors raised by the command-mode protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Writing a command to the port failed.
    #[error("failed to send '{command}': {source}")]
    WriteFailed {
        command: String,
        #[source]
        source: PortError,
    },

    /// No usable response line could be read.
    #[error("no response to '{command}': {source}")]
    Read {
        command: String,
        #[source]
        source: ReadError,
    },

    /// The response did not start with the expected token.
    #[error("unexpected response to '{command}': {response:?}")]
    UnexpectedResponse { command: String, response: String },

    /// The command text cannot be framed.
    #[error("invalid AT command {0:?}")]
    InvalidCommand(String),
}

impl ProtocolError {
    /// Numeric result code reported to the presentation layer.
    pub fn code(&self) -> i32 {
        match self {
            Self::WriteFailed { .. } => -1,
            Self::Read { .. } => -2,
            Self::UnexpectedResponse { .. } => -3,
            Self::InvalidCommand(_) => -4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnexpectedResponse {
            command: "+++".into(),
            response: "ERROR".into(),
        };
        assert_eq!(err.to_string(), "unexpected response to '+++': \"ERROR\"");
        assert_eq!(err.code(), -3);

        let err = ProtocolError::Read {
            command: "atcn".into(),
            source: ReadError::Disconnected,
        };
        assert!(err.to_string().starts_with("no response to 'atcn'"));
        assert_eq!(err.code(), -2);
    }
}
