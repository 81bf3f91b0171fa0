//! XBee AT command-mode protocol.
//!
//! - `at`: command framing and the fixed tokens of the handshake
//! - `command_mode`: the `Idle`/`CommandMode` state machine
//! - `error`: protocol errors

pub mod at;
pub mod command_mode;
pub mod error;

pub use at::{AtCommand, ADDRESS_COMMAND, EXIT_COMMAND, GUARD_SEQUENCE, OK_TOKEN};
pub use command_mode::{CommandMode, ProtocolState};
pub use error::ProtocolError;

use crate::reader::ResponseLine;
use serde::Serialize;

/// Outcome of one caller-facing operation, ready for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandModeResult {
    /// Operation name, e.g. `enter` or `query ATMY`.
    pub operation: String,
    pub success: bool,
    /// `0` on success, otherwise the error's result code.
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandModeResult {
    pub fn from_unit(operation: impl Into<String>, result: &Result<(), ProtocolError>) -> Self {
        match result {
            Ok(()) => Self::success(operation, None),
            Err(err) => Self::failure(operation, err.code(), err),
        }
    }

    pub fn from_query(
        operation: impl Into<String>,
        result: &Result<ResponseLine, ProtocolError>,
    ) -> Self {
        match result {
            Ok(line) => Self::success(operation, Some(line.to_text())),
            Err(err) => Self::failure(operation, err.code(), err),
        }
    }

    pub fn success(operation: impl Into<String>, response: Option<String>) -> Self {
        Self {
            operation: operation.into(),
            success: true,
            code: 0,
            response,
            error: None,
        }
    }

    pub fn failure(operation: impl Into<String>, code: i32, error: impl ToString) -> Self {
        Self {
            operation: operation.into(),
            success: false,
            code,
            response: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_query() {
        let ok: Result<ResponseLine, ProtocolError> = Ok(ResponseLine::new(b"1A2B".to_vec()));
        let result = CommandModeResult::from_query("address", &ok);
        assert!(result.success);
        assert_eq!(result.response.as_deref(), Some("1A2B"));

        let err: Result<(), ProtocolError> = Err(ProtocolError::InvalidCommand(String::new()));
        let result = CommandModeResult::from_unit("enter", &err);
        assert!(!result.success);
        assert_eq!(result.code, -4);
    }

    #[test]
    fn test_result_json_omits_empty_fields() {
        let result = CommandModeResult::success("exit", None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"operation": "exit", "success": true, "code": 0})
        );
    }
}
