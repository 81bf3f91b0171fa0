//! Configuration module for xbee_serial.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `--config <path>` on the command line
//! 2. `XBEE_SERIAL_CONFIG` environment variable (explicit path)
//! 3. `./xbee.toml` (current directory)
//! 4. `<platform config dir>/xbee-serial/config.toml`
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `XBEE_SERIAL_<SECTION>_<KEY>`:
//! - `XBEE_SERIAL_SERIAL_DEVICE=/dev/ttyUSB1`
//! - `XBEE_SERIAL_SERIAL_BAUD=9600`
//! - `XBEE_SERIAL_SERIAL_POLL_TIMEOUT_US=1000`
//! - `XBEE_SERIAL_SERIAL_RESPONSE_DEADLINE_MS=0` (wait forever)
//! - `XBEE_SERIAL_SERIAL_TRANSLATE_CR=1`
//! - `XBEE_SERIAL_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyUSB0"
//! baud = 9600
//! poll_timeout = { secs = 0, micros = 1000 }
//! response_deadline_ms = 5000
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{ChatConfig, Config, LogFormat, LoggingConfig, SerialConfig};
