//! XBee serial driver library
//!
//! Host-side support for talking to an XBee radio over a serial line: a port
//! session owning the configured TTY, a readiness multiplexer, a bounded
//! CR-terminated line reader and the AT command-mode protocol.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Unified error handling
//! - `port`: Port session, adapter trait, TTY implementation and mock peer
//! - `readiness`: Waiting for handles to become readable
//! - `reader`: Deadline-bounded response line reader
//! - `protocol`: Command-mode state machine
//! - `frontend`: Menu and chat presentation layers
//! - `logging`: Tracing subscriber setup

pub mod config;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod reader;
pub mod readiness;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use port::{
    BaudRate, MockSerialPort, PortConfig, PortError, PortSession, SerialPortAdapter,
};
pub use protocol::{AtCommand, CommandMode, CommandModeResult, ProtocolError, ProtocolState};
pub use reader::{LineReader, ReadError, ResponseLine};
pub use readiness::{Handle, Multiplexer};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
