//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "XBEE_SERIAL";

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE: &str = "xbee.toml";

/// Config file name inside the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "XBEE_SERIAL_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `XBEE_SERIAL_CONFIG` environment variable (explicit path)
    /// 2. `./xbee.toml` (current directory)
    /// 3. `<platform config dir>/xbee-serial/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory for this tool.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "xbee-serial").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|value| (name, value))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str, what: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(name, format!("Invalid {what}: {value:?}")))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `XBEE_SERIAL_<SECTION>_<KEY>`
/// For example:
/// - `XBEE_SERIAL_SERIAL_DEVICE=/dev/ttyUSB1`
/// - `XBEE_SERIAL_SERIAL_BAUD=115200`
/// - `XBEE_SERIAL_LOGGING_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_var("SERIAL_DEVICE") {
        config.serial.device = val;
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = parse_env(&name, &val, "baud rate")?;
    }
    if let Some((name, val)) = env_var("SERIAL_POLL_TIMEOUT_US") {
        let micros: u64 = parse_env(&name, &val, "poll timeout")?;
        config.serial.poll_timeout =
            crate::readiness::PollTimeout::from_duration(std::time::Duration::from_micros(micros));
    }
    if let Some((name, val)) = env_var("SERIAL_RESPONSE_DEADLINE_MS") {
        config.serial.response_deadline_ms = parse_env(&name, &val, "deadline")?;
    }
    if let Some((_, val)) = env_var("SERIAL_TRANSLATE_CR") {
        config.serial.translate_cr_to_nl = parse_bool(&val);
    }
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}
