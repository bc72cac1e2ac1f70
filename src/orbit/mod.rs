//! # Orbit Module
//!
//! Estimates the tracked satellite's sub-point from published orbital
//! elements.
//!
//! Elements are parsed from a TLE file once at construction; a malformed
//! or missing element set is fatal there and never surfaces per tick.
//! `position_at` is a pure computation: SGP4 propagation with the `sgp4`
//! crate, then a TEME to WGS84 geodetic conversion (see [`frames`]).

pub mod frames;

use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AstroLoggerError, Result};

/// Estimated sub-point and velocity of the tracked satellite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubPoint {
    /// Geodetic latitude of the point beneath the satellite, degrees
    pub latitude_deg: f64,
    /// Geodetic longitude, degrees, in [-180, 180]
    pub longitude_deg: f64,
    /// Height above the WGS84 ellipsoid, km
    pub elevation_km: f64,
    /// Velocity in the propagator's inertial (TEME) frame, km/s
    pub velocity_km_s: [f64; 3],
}

/// SGP4-backed position estimator
///
/// Construction loads and validates the orbital elements; after that the
/// estimator is immutable and deterministic given an instant.
pub struct OrbitEstimator {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    name: String,
}

impl std::fmt::Debug for OrbitEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrbitEstimator")
            .field("name", &self.name)
            .field("norad_id", &self.elements.norad_id)
            .finish_non_exhaustive()
    }
}

impl OrbitEstimator {
    /// Build an estimator from two TLE lines.
    ///
    /// # Errors
    ///
    /// Returns `Orbit` if the lines fail checksum/format validation or the
    /// derived constants are unusable. Both are construction-time faults;
    /// the session never starts with a broken estimator.
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self> {
        let elements =
            sgp4::Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
                .map_err(|e| AstroLoggerError::Orbit(format!("failed to parse TLE: {e}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| AstroLoggerError::Orbit(format!("invalid orbital elements: {e}")))?;

        debug!("orbital elements loaded: NORAD {}", elements.norad_id);
        Ok(Self {
            elements,
            constants,
            name: name.to_string(),
        })
    }

    /// Load elements from a TLE file.
    ///
    /// Accepts both two-line and named three-line sets; the first element
    /// pair in the file is used, with `fallback_name` applied when no name
    /// line precedes it.
    pub fn from_tle_file<P: AsRef<Path>>(path: P, fallback_name: &str) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            AstroLoggerError::Orbit(format!("failed to read {}: {e}", path.display()))
        })?;

        let lines: Vec<&str> = contents
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();

        for (i, window) in lines.windows(2).enumerate() {
            if window[0].starts_with("1 ") && window[1].starts_with("2 ") {
                let name = if i > 0 && !lines[i - 1].starts_with("1 ") && !lines[i - 1].starts_with("2 ") {
                    lines[i - 1].trim()
                } else {
                    fallback_name
                };
                let estimator = Self::from_tle(name, window[0], window[1])?;
                info!("TLE loaded from {} for {}", path.display(), estimator.name());
                return Ok(estimator);
            }
        }

        Err(AstroLoggerError::Orbit(format!(
            "no TLE element pair found in {}",
            path.display()
        )))
    }

    /// Satellite name from the element set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Estimate the sub-point at `at`.
    ///
    /// `at` must be expressed in the estimator's timescale (UTC); the
    /// ephemeris clock strategy guarantees this for the sample loop.
    pub fn position_at(&self, at: DateTime<Utc>) -> Result<SubPoint> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| {
                AstroLoggerError::Orbit(format!("instant outside propagation range: {e}"))
            })?;
        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| AstroLoggerError::Orbit(format!("propagation failed: {e}")))?;

        let ecef = frames::teme_to_ecef(prediction.position, frames::gmst(at));
        let (latitude_deg, longitude_deg, elevation_km) = frames::ecef_to_geodetic(ecef);

        Ok(SubPoint {
            latitude_deg,
            longitude_deg,
            elevation_km,
            velocity_km_s: prediction.velocity,
        })
    }
}
