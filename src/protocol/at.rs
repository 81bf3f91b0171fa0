//! AT command framing.

use super::error::ProtocolError;
use crate::reader::CR;
use std::fmt;
use std::str::FromStr;

/// Sequence that requests command mode. Sent without a terminator.
pub const GUARD_SEQUENCE: &[u8] = b"+++";

/// Token a module answers with when entering or leaving command mode.
pub const OK_TOKEN: &[u8] = b"OK";

/// Leave command mode.
pub const EXIT_COMMAND: &str = "atcn";

/// Read the module's 16-bit network address.
pub const ADDRESS_COMMAND: &str = "ATMY";

/// A validated AT command: non-empty printable ASCII, no CR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtCommand(String);

impl AtCommand {
    pub fn new(text: impl Into<String>) -> Result<Self, ProtocolError> {
        let text = text.into();
        let valid = !text.is_empty() && text.bytes().all(|b| b.is_ascii() && !b.is_ascii_control());
        if !valid {
            return Err(ProtocolError::InvalidCommand(text));
        }
        Ok(Self(text))
    }

    /// The `ATCN` exit command, in the lowercase form modules accept.
    pub fn exit() -> Self {
        Self(EXIT_COMMAND.to_string())
    }

    /// The `ATMY` address query.
    pub fn address() -> Self {
        Self(ADDRESS_COMMAND.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes on the wire: the command followed by CR.
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.0.len() + 1);
        frame.extend_from_slice(self.0.as_bytes());
        frame.push(CR);
        frame
    }
}

impl FromStr for AtCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
