//! Port abstraction layer for serial communication.
//!
//! Provides the session that owns the serial handle, the adapter trait it
//! drives, the real TTY implementation and a scripted mock peer for tests.

pub mod error;
pub mod mock;
pub mod session;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::{ConfigStep, PortError};
pub use mock::{MockMultiplexer, MockSerialPort, MOCK_HANDLE};
pub use session::{resolve_path, PortSession, DEFAULT_DEVICE, MAX_PATH_LEN};
pub use traits::*;

#[cfg(unix)]
pub use tty::TtyPort;
