//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every run parameter is fixed here at startup and never re-read
//! mid-run. The run duration is deliberately a config value: the flight
//! build uses the full 10680 s (178 minutes) window while a desk test can
//! shorten it without touching code.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub orbit: OrbitConfig,
}

/// Run timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Total run length in seconds
    #[serde(default = "default_duration_s")]
    pub duration_s: u64,

    /// Sleep between the end of one tick and the start of the next
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,

    /// Iterations between progress log lines
    #[serde(default = "default_progress_log_interval")]
    pub progress_log_interval: u64,

    /// Event log file path
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// Record file configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecordConfig {
    /// CSV record file path, created fresh each run
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

/// LED matrix configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,

    /// Ticks per indicator step
    #[serde(default = "default_advance_interval")]
    pub advance_interval: u64,

    /// Dim the matrix; flight units require reduced brightness
    #[serde(default)]
    pub low_light: bool,
}

/// Orbital elements configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OrbitConfig {
    /// TLE file holding the tracked satellite's published elements
    #[serde(default = "default_tle_file")]
    pub tle_file: String,

    /// Name used when the TLE file carries no name line
    #[serde(default = "default_satellite_name")]
    pub satellite_name: String,
}

// Default value functions
fn default_duration_s() -> u64 { 10680 }
fn default_sleep_ms() -> u64 { 500 }
fn default_progress_log_interval() -> u64 { 100 }
fn default_log_file() -> String { "events.log".to_string() }

fn default_data_file() -> String { "data.csv".to_string() }

fn default_display_enabled() -> bool { true }
fn default_advance_interval() -> u64 { 25 }

fn default_tle_file() -> String { "iss.tle".to_string() }
fn default_satellite_name() -> String { "ISS (ZARYA)".to_string() }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_s: default_duration_s(),
            sleep_ms: default_sleep_ms(),
            progress_log_interval: default_progress_log_interval(),
            log_file: default_log_file(),
        }
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            advance_interval: default_advance_interval(),
            low_light: false,
        }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            tle_file: default_tle_file(),
            satellite_name: default_satellite_name(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            record: RecordConfig::default(),
            display: DisplayConfig::default(),
            orbit: OrbitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` when it exists, defaults otherwise.
    ///
    /// A present-but-invalid file is still an error; only absence falls
    /// back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("no config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.run.duration_s == 0 {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("duration_s must be greater than 0"),
            ));
        }

        if self.run.sleep_ms == 0 || self.run.sleep_ms > 60000 {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("sleep_ms must be between 1 and 60000"),
            ));
        }

        if self.run.progress_log_interval == 0 {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("progress_log_interval must be greater than 0"),
            ));
        }

        if self.display.advance_interval == 0 {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("advance_interval must be greater than 0"),
            ));
        }

        if self.record.data_file.is_empty() {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("data_file cannot be empty"),
            ));
        }

        if self.run.log_file.is_empty() {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("log_file cannot be empty"),
            ));
        }

        if self.orbit.tle_file.is_empty() {
            return Err(crate::error::AstroLoggerError::Config(
                toml::de::Error::custom("tle_file cannot be empty"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.run.duration_s, 10680, "full mission window is 178 minutes");
        assert_eq!(config.run.sleep_ms, 500);
        assert_eq!(config.run.progress_log_interval, 100);
        assert_eq!(config.display.advance_interval, 25);
        assert!(config.display.enabled);
        assert!(!config.display.low_light);
        assert_eq!(config.record.data_file, "data.csv");
        assert_eq!(config.run.log_file, "events.log");
        assert_eq!(config.orbit.satellite_name, "ISS (ZARYA)");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.run.duration_s, 10680);
        assert_eq!(config.record.data_file, "data.csv");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [run]
            duration_s = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.run.duration_s, 60);
        assert_eq!(config.run.sleep_ms, 500);
        assert_eq!(config.display.advance_interval, 25);
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut config = Config::default();
        config.run.duration_s = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sleep() {
        let mut config = Config::default();
        config.run.sleep_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_advance_interval() {
        let mut config = Config::default();
        config.display.advance_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut config = Config::default();
        config.record.data_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nduration_s = 0").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml").unwrap();
        assert_eq!(config.run.duration_s, 10680);
    }
}
