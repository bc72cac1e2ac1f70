//! Earth-frame conversions for SGP4 output.
//!
//! The propagator emits position and velocity in the TEME inertial frame.
//! The sub-point needs geodetic coordinates, so TEME is rotated into ECEF
//! by Greenwich Mean Sidereal Time and then converted to WGS84
//! latitude/longitude/height with Bowring's method.

use chrono::{DateTime, Utc};

/// WGS84 semi-major axis in km
pub const WGS84_A_KM: f64 = 6378.137;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Julian date of the Unix epoch
const JD_UNIX_EPOCH: f64 = 2_440_587.5;

/// Julian date of J2000.0
const JD_J2000: f64 = 2_451_545.0;

/// Julian date for an instant
pub fn julian_date(at: DateTime<Utc>) -> f64 {
    let seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9;
    JD_UNIX_EPOCH + seconds / 86_400.0
}

/// Greenwich Mean Sidereal Time in radians (IAU 1982 expression)
pub fn gmst(at: DateTime<Utc>) -> f64 {
    let d = julian_date(at) - JD_J2000;
    let t = d / 36_525.0;
    let degrees = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    degrees.rem_euclid(360.0).to_radians()
}

/// Rotate a TEME vector into ECEF by the sidereal angle
pub fn teme_to_ecef(teme_km: [f64; 3], gmst_rad: f64) -> [f64; 3] {
    let (sin_g, cos_g) = gmst_rad.sin_cos();
    [
        teme_km[0] * cos_g + teme_km[1] * sin_g,
        -teme_km[0] * sin_g + teme_km[1] * cos_g,
        teme_km[2],
    ]
}

/// Convert an ECEF position to WGS84 geodetic coordinates.
///
/// Returns (latitude in degrees, longitude in degrees, height in km).
pub fn ecef_to_geodetic(ecef_km: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = ecef_km;
    let a = WGS84_A_KM;
    let b = a * (1.0 - WGS84_F);
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = e2 / (1.0 - e2);

    let p = (x * x + y * y).sqrt();
    let theta = (z * a).atan2(p * b);
    let lat = (z + ep2 * b * theta.sin().powi(3)).atan2(p - e2 * a * theta.cos().powi(3));
    let lon = y.atan2(x);

    let n = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    // The usual height expression degenerates at the poles
    let height = if lat.cos().abs() > 1e-10 {
        p / lat.cos() - n
    } else {
        z.abs() - b
    };

    (lat.to_degrees(), lon.to_degrees(), height)
}
