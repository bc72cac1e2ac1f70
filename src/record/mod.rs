//! # Record Module
//!
//! The append-only CSV record file and the samples written into it.
//!
//! This module handles:
//! - The per-mode positional column schemas (downstream analysis indexes
//!   columns by position, so header text and field order must match)
//! - Serializing one sample per row with the `csv` crate
//! - The "at-most-once, never crash" durability policy: creation and
//!   append failures are logged and swallowed, the loop stays live
//!
//! The file is created fresh at session start, flushed after every row,
//! and never re-read by this process.

use std::fs::File;
use std::path::Path;
use tracing::{error, info};

use crate::board::OrientationReading;
use crate::error::Result;
use crate::orbit::SubPoint;
use crate::source::Mode;

/// Full-hardware schema: 17 columns
pub const FULL_COLUMNS: &[&str] = &[
    "BeforeTimestamp",
    "LoopCounter",
    "Latitude",
    "Longitude",
    "Elevation(km)",
    "Velocity(x km/s)",
    "Velocity(y km/s)",
    "Velocity(z km/s)",
    "MagnetometerX",
    "MagnetometerY",
    "MagnetometerZ",
    "GyroscopeX",
    "GyroscopeY",
    "GyroscopeZ",
    "AccelerometerX",
    "AccelerometerY",
    "AccelerometerZ",
    "AfterTimestamp",
];

/// Sensor-only schema: 12 columns
pub const SENSOR_COLUMNS: &[&str] = &[
    "BeforeTimestamp",
    "LoopCounter",
    "MagnetometerX",
    "MagnetometerY",
    "MagnetometerZ",
    "GyroscopeX",
    "GyroscopeY",
    "GyroscopeZ",
    "AccelerometerX",
    "AccelerometerY",
    "AccelerometerZ",
    "AfterTimestamp",
];

/// Position-only schema: 9 columns
pub const POSITION_COLUMNS: &[&str] = &[
    "BeforeTimestamp",
    "LoopCounter",
    "Latitude",
    "Longitude",
    "Elevation(km)",
    "Velocity(x km/s)",
    "Velocity(y km/s)",
    "Velocity(z km/s)",
    "AfterTimestamp",
];

/// Header columns for a mode; fixed at file creation, never changed mid-file
pub fn columns(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::FullHardware => FULL_COLUMNS,
        Mode::SensorOnly => SENSOR_COLUMNS,
        Mode::PositionOnly => POSITION_COLUMNS,
    }
}

/// One acquisition event, immutable once assembled
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Instant captured immediately before acquisition began
    pub before: String,
    /// Loop iteration this sample was taken on
    pub counter: u64,
    pub subpoint: Option<SubPoint>,
    pub orientation: Option<OrientationReading>,
    /// Instant captured immediately after acquisition completed
    pub after: String,
}

impl Sample {
    /// Ordered fields matching `columns(mode)`.
    ///
    /// Returns `None` when the sample does not carry what the schema
    /// requires, so a mismatched sample can never produce a partial row.
    pub fn to_fields(&self, mode: Mode) -> Option<Vec<String>> {
        let mut fields = vec![self.before.clone(), self.counter.to_string()];

        if matches!(mode, Mode::FullHardware | Mode::PositionOnly) {
            let subpoint = self.subpoint?;
            fields.push(subpoint.latitude_deg.to_string());
            fields.push(subpoint.longitude_deg.to_string());
            fields.push(subpoint.elevation_km.to_string());
            for v in subpoint.velocity_km_s {
                fields.push(v.to_string());
            }
        }

        if matches!(mode, Mode::FullHardware | Mode::SensorOnly) {
            let orientation = self.orientation?;
            for axis in orientation.magnetometer {
                fields.push(axis.to_string());
            }
            for axis in orientation.gyroscope {
                fields.push(axis.to_string());
            }
            for axis in orientation.accelerometer {
                fields.push(axis.to_string());
            }
        }

        fields.push(self.after.clone());
        Some(fields)
    }
}

/// Append-only record file handle
///
/// A writer that failed to open degrades the session to log-only
/// persistence instead of aborting it.
pub struct RecordWriter {
    mode: Mode,
    sink: Option<csv::Writer<File>>,
}

impl RecordWriter {
    /// Create (truncating) the record file and write the header row.
    ///
    /// Failure is reported to the log sink and leaves the writer in the
    /// degraded no-op state; the sample loop runs regardless.
    pub fn create<P: AsRef<Path>>(path: P, mode: Mode) -> Self {
        let path = path.as_ref();
        match Self::open(path, mode) {
            Ok(sink) => {
                info!("record file created at {}", path.display());
                Self {
                    mode,
                    sink: Some(sink),
                }
            }
            Err(e) => {
                error!("{}: continuing without record file at {}: {e}", e.kind(), path.display());
                Self { mode, sink: None }
            }
        }
    }

    fn open(path: &Path, mode: Mode) -> Result<csv::Writer<File>> {
        let mut sink = csv::Writer::from_path(path)?;
        sink.write_record(columns(mode))?;
        sink.flush()?;
        Ok(sink)
    }

    /// Whether rows are actually reaching the file
    pub fn is_persisting(&self) -> bool {
        self.sink.is_some()
    }

    /// Schema this file was created with
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Append one sample row and flush it.
    ///
    /// At-most-once: a failed row is logged and dropped, never retried,
    /// and never aborts the loop.
    pub fn append(&mut self, sample: &Sample) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let Some(fields) = sample.to_fields(self.mode) else {
            let err = crate::error::AstroLoggerError::Record(format!(
                "sample {} does not match the {} schema, row dropped",
                sample.counter, self.mode
            ));
            error!("{}: {err}", err.kind());
            return;
        };

        let written = sink
            .write_record(&fields)
            .and_then(|()| sink.flush().map_err(csv::Error::from));
        if let Err(e) = written {
            error!("CsvError: dropping row {}: {e}", sample.counter);
        }
    }
}
