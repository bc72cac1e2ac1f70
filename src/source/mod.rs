//! # Data Source Module
//!
//! Startup capability probe and the mode-fixed data source the sample
//! loop draws from.
//!
//! The probe runs once, before the loop starts, and resolves to a tagged
//! [`Mode`] rather than a mutable global: the loop body is identical on a
//! flight unit with the full sensor board, on developer hardware without
//! one, and on a desktop with only the orbital elements.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::board::imu::Lsm9ds1;
use crate::board::{OrientationReading, SensorBoard};
use crate::config::Config;
use crate::error::{AstroLoggerError, Result};
use crate::orbit::{OrbitEstimator, SubPoint};

/// Data-source capability mode, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Sensor board and orbital elements both available
    FullHardware,
    /// Sensor board only
    SensorOnly,
    /// Orbital elements only
    PositionOnly,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Mode::FullHardware => "full-hardware",
            Mode::SensorOnly => "sensor-only",
            Mode::PositionOnly => "position-only",
        };
        f.write_str(label)
    }
}

/// Uniform per-tick reading; which halves are populated is fixed per mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub orientation: Option<OrientationReading>,
    pub subpoint: Option<SubPoint>,
}

/// Mode-fixed data source
///
/// Owns the sensor board handle and the estimator for the session
/// lifetime; the single loop flow is the only caller.
pub struct DataSource {
    mode: Mode,
    board: Option<Box<dyn SensorBoard>>,
    estimator: Option<OrbitEstimator>,
}

impl DataSource {
    /// Assemble a source from probed capabilities.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnavailable` when neither collaborator is present;
    /// the session never transitions to Running in that case.
    pub fn new(
        board: Option<Box<dyn SensorBoard>>,
        estimator: Option<OrbitEstimator>,
    ) -> Result<Self> {
        let mode = match (&board, &estimator) {
            (Some(_), Some(_)) => Mode::FullHardware,
            (Some(_), None) => Mode::SensorOnly,
            (None, Some(_)) => Mode::PositionOnly,
            (None, None) => return Err(AstroLoggerError::SourceUnavailable),
        };
        Ok(Self {
            mode,
            board,
            estimator,
        })
    }

    /// Probe the hardware and element file once at startup.
    ///
    /// Absence of either collaborator is informational, not an error; it
    /// is resolved by mode selection.
    pub fn probe(config: &Config) -> Result<Self> {
        let board: Option<Box<dyn SensorBoard>> = match Lsm9ds1::open() {
            Ok(imu) => Some(Box::new(imu)),
            Err(e) => {
                info!("sensor board unavailable, dropping sensor columns: {e}");
                None
            }
        };

        let estimator = match OrbitEstimator::from_tle_file(
            &config.orbit.tle_file,
            &config.orbit.satellite_name,
        ) {
            Ok(estimator) => Some(estimator),
            Err(e) => {
                info!("position estimator unavailable, dropping position columns: {e}");
                None
            }
        };

        let source = Self::new(board, estimator)?;
        info!("selected {} mode", source.mode());
        Ok(source)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// One acquisition at `at`.
    ///
    /// In full-hardware mode both the sensor read and the estimator query
    /// must succeed; a fault in either skips the whole tick's sample so no
    /// partial row is ever written.
    pub fn sample(&mut self, at: DateTime<Utc>) -> Result<Reading> {
        let orientation = match self.board.as_mut() {
            Some(board) => Some(board.read_orientation()?),
            None => None,
        };
        let subpoint = match self.estimator.as_ref() {
            Some(estimator) => Some(estimator.position_at(at)?),
            None => None,
        };
        Ok(Reading {
            orientation,
            subpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::mocks::MockSensorBoard;

    const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn estimator() -> OrbitEstimator {
        OrbitEstimator::from_tle("ISS (ZARYA)", ISS_LINE1, ISS_LINE2).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 25, 40).unwrap()
    }

    #[test]
    fn test_mode_resolution() {
        let full = DataSource::new(Some(Box::new(MockSensorBoard::new())), Some(estimator()));
        assert_eq!(full.unwrap().mode(), Mode::FullHardware);

        let sensor = DataSource::new(Some(Box::new(MockSensorBoard::new())), None);
        assert_eq!(sensor.unwrap().mode(), Mode::SensorOnly);

        let position = DataSource::new(None, Some(estimator()));
        assert_eq!(position.unwrap().mode(), Mode::PositionOnly);
    }

    #[test]
    fn test_no_source_at_all_is_fatal() {
        let result = DataSource::new(None, None);
        assert!(matches!(result, Err(AstroLoggerError::SourceUnavailable)));
    }

    #[test]
    fn test_reading_shape_is_fixed_per_mode() {
        let mut full =
            DataSource::new(Some(Box::new(MockSensorBoard::new())), Some(estimator())).unwrap();
        let reading = full.sample(epoch()).unwrap();
        assert!(reading.orientation.is_some());
        assert!(reading.subpoint.is_some());

        let mut sensor = DataSource::new(Some(Box::new(MockSensorBoard::new())), None).unwrap();
        let reading = sensor.sample(epoch()).unwrap();
        assert!(reading.orientation.is_some());
        assert!(reading.subpoint.is_none());

        let mut position = DataSource::new(None, Some(estimator())).unwrap();
        let reading = position.sample(epoch()).unwrap();
        assert!(reading.orientation.is_none());
        assert!(reading.subpoint.is_some());
    }

    #[test]
    fn test_sensor_fault_skips_the_whole_sample() {
        let mut source = DataSource::new(
            Some(Box::new(MockSensorBoard::failing_on(&[1]))),
            Some(estimator()),
        )
        .unwrap();

        let result = source.sample(epoch());
        assert!(matches!(result, Err(AstroLoggerError::Sensor(_))));

        // The next tick recovers
        assert!(source.sample(epoch()).is_ok());
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(Mode::FullHardware.to_string(), "full-hardware");
        assert_eq!(Mode::SensorOnly.to_string(), "sensor-only");
        assert_eq!(Mode::PositionOnly.to_string(), "position-only");
    }
}
