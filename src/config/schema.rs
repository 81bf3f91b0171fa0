//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::{BaudRate, PortConfig, DEFAULT_RESPONSE_DEADLINE, MAX_BUFFER_SIZE, MAX_PATH_LEN};
use crate::readiness::PollTimeout;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Chat front end configuration
    pub chat: ChatConfig,
}

impl Config {
    /// Check every section for out-of-range values.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.port_config().map(|_| ())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; empty selects `/dev/ttyUSB0`
    pub device: String,
    /// Line speed in bits per second
    pub baud: u32,
    /// Bounded wait of each readiness poll
    pub poll_timeout: PollTimeout,
    /// Overall deadline for one response in milliseconds; 0 waits forever
    pub response_deadline_ms: u64,
    /// Longest accepted response line
    pub max_line_len: usize,
    /// Translate incoming CR to NL at the OS layer
    pub translate_cr_to_nl: bool,
    /// Quiet period before the guard sequence, in milliseconds
    pub guard_silence_ms: u64,
    /// Device aliases for convenience
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud: 9600,
            poll_timeout: PollTimeout::default(),
            response_deadline_ms: DEFAULT_RESPONSE_DEADLINE.as_millis() as u64,
            max_line_len: MAX_BUFFER_SIZE,
            translate_cr_to_nl: false,
            guard_silence_ms: 0,
            aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Overall response deadline, `None` when disabled
    pub fn response_deadline(&self) -> Option<Duration> {
        (self.response_deadline_ms > 0).then(|| Duration::from_millis(self.response_deadline_ms))
    }

    /// Resolve a device name through aliases
    pub fn resolve_device(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Validate the section and build the session configuration.
    pub fn port_config(&self) -> ConfigResult<PortConfig> {
        let baud_rate = BaudRate::try_from(self.baud)
            .map_err(|message| ConfigError::validation("serial.baud", message))?;

        if self.device.len() > MAX_PATH_LEN {
            return Err(ConfigError::validation(
                "serial.device",
                format!("device path longer than {MAX_PATH_LEN} bytes"),
            ));
        }
        if self.max_line_len == 0 || self.max_line_len > MAX_BUFFER_SIZE {
            return Err(ConfigError::validation(
                "serial.max_line_len",
                format!("must be between 1 and {MAX_BUFFER_SIZE}"),
            ));
        }
        if self.poll_timeout.micros >= 1_000_000 {
            return Err(ConfigError::validation(
                "serial.poll_timeout.micros",
                "must be below 1000000",
            ));
        }

        Ok(PortConfig {
            baud_rate,
            poll_timeout: self.poll_timeout,
            response_deadline: self.response_deadline(),
            max_line_len: self.max_line_len,
            translate_cr_to_nl: self.translate_cr_to_nl,
            guard_silence: Duration::from_millis(self.guard_silence_ms),
        })
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}

/// Chat front end configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Prefix relayed lines with the local time
    pub show_timestamps: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.serial.device, "");
        assert_eq!(config.serial.response_deadline(), Some(Duration::from_secs(5)));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .aliases
            .insert("coordinator".to_string(), "/dev/ttyUSB1".to_string());

        assert_eq!(config.resolve_device("coordinator"), "/dev/ttyUSB1");
        assert_eq!(config.resolve_device("/dev/ttyS0"), "/dev/ttyS0");
    }

    #[test]
    fn test_port_config_conversion() {
        let serial = SerialConfig {
            baud: 57600,
            response_deadline_ms: 0,
            translate_cr_to_nl: true,
            guard_silence_ms: 1100,
            ..SerialConfig::default()
        };
        let port = serial.port_config().unwrap();
        assert_eq!(port.baud_rate, BaudRate::B57600);
        assert_eq!(port.response_deadline, None);
        assert!(port.translate_cr_to_nl);
        assert_eq!(port.guard_silence, Duration::from_millis(1100));
    }

    #[test]
    fn test_validation_errors() {
        let bad_baud = SerialConfig {
            baud: 12345,
            ..SerialConfig::default()
        };
        assert!(matches!(
            bad_baud.port_config(),
            Err(ConfigError::ValidationError { ref key, .. }) if key == "serial.baud"
        ));

        let bad_len = SerialConfig {
            max_line_len: 256,
            ..SerialConfig::default()
        };
        assert!(bad_len.port_config().is_err());

        let bad_device = SerialConfig {
            device: "d".repeat(300),
            ..SerialConfig::default()
        };
        assert!(bad_device.port_config().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            device = "/dev/ttyAMA0"
            baud = 115200
            poll_timeout = { secs = 0, micros = 5000 }

            [chat]
            show_timestamps = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyAMA0");
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.serial.poll_timeout.micros, 5000);
        assert!(config.chat.show_timestamps);
        // Defaults should still work
        assert_eq!(config.serial.max_line_len, 255);
        assert_eq!(config.logging.level, "warn");
    }
}
