//! # Error Types
//!
//! Custom error types for AstroLogger using `thiserror`.
//!
//! The variants mirror the fault taxonomy of the sample loop: transient
//! acquisition faults (`Sensor`, `Display`), persistence faults (`Record`,
//! `Csv`, `Io`), and construction-time faults (`Orbit`, `SourceUnavailable`,
//! `Config`). Nothing raised inside a tick escapes the tick boundary; the
//! loop logs the kind and message and moves on.

use thiserror::Error;

/// Main error type for AstroLogger
#[derive(Debug, Error)]
pub enum AstroLoggerError {
    /// Transient sensor board read fault
    #[error("sensor read failed: {0}")]
    Sensor(String),

    /// LED matrix fault
    #[error("LED matrix fault: {0}")]
    Display(String),

    /// Orbital elements or propagation errors
    #[error("orbit estimation failed: {0}")]
    Orbit(String),

    /// Record file fault
    #[error("record file fault: {0}")]
    Record(String),

    /// No data source could be established at startup
    #[error("no data source available: neither the sensor board nor orbital elements could be opened")]
    SourceUnavailable,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AstroLoggerError {
    /// Short kind label so a contained fault is always logged as
    /// kind plus message.
    pub fn kind(&self) -> &'static str {
        match self {
            AstroLoggerError::Sensor(_) => "SensorError",
            AstroLoggerError::Display(_) => "DisplayError",
            AstroLoggerError::Orbit(_) => "OrbitError",
            AstroLoggerError::Record(_) => "RecordError",
            AstroLoggerError::SourceUnavailable => "SourceUnavailable",
            AstroLoggerError::Config(_) => "ConfigError",
            AstroLoggerError::Io(_) => "IoError",
            AstroLoggerError::Csv(_) => "CsvError",
        }
    }
}

/// Result type alias for AstroLogger
pub type Result<T> = std::result::Result<T, AstroLoggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AstroLoggerError::Sensor("x".into()).kind(), "SensorError");
        assert_eq!(AstroLoggerError::Orbit("x".into()).kind(), "OrbitError");
        assert_eq!(AstroLoggerError::SourceUnavailable.kind(), "SourceUnavailable");
    }

    #[test]
    fn test_display_includes_message() {
        let err = AstroLoggerError::Sensor("bus timeout".into());
        assert!(err.to_string().contains("bus timeout"));
    }
}
