//! # Sensor Board Module
//!
//! Trait abstractions for the Sense HAT hardware, plus the real drivers.
//!
//! This module handles:
//! - The orientation sensor seam ([`SensorBoard`]) used by the data source
//! - The LED matrix seam ([`LedMatrix`]) used by the progress indicator
//! - The LSM9DS1 IMU driver over I2C ([`imu::Lsm9ds1`])
//! - The Sense HAT framebuffer matrix driver ([`led::SenseFb`])
//!
//! The traits exist so the sample loop can run against mock hardware in
//! tests and so capability probing can degrade gracefully when the board
//! is absent.

pub mod imu;
pub mod led;

use crate::error::Result;

/// RGB color of one LED matrix cell
pub type Rgb = (u8, u8, u8);

/// Matrix edge length in cells
pub const MATRIX_SIZE: usize = 8;

/// Total number of cells in the LED matrix
pub const MATRIX_CELLS: usize = MATRIX_SIZE * MATRIX_SIZE;

/// One raw orientation reading from the sensor board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReading {
    /// Magnetic field strength per axis in microteslas
    pub magnetometer: [f64; 3],
    /// Rotational rate per axis in radians per second
    pub gyroscope: [f64; 3],
    /// Acceleration per axis in g
    pub accelerometer: [f64; 3],
}

/// Trait for the orientation sensor stack
pub trait SensorBoard: Send {
    /// Read magnetometer, gyroscope and accelerometer in one pass
    fn read_orientation(&mut self) -> Result<OrientationReading>;
}

/// Trait for the 8x8 indicator matrix
pub trait LedMatrix: Send {
    /// Light a single cell
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()>;

    /// Replace the whole matrix image
    fn set_pixels(&mut self, pixels: &[Rgb; MATRIX_CELLS]) -> Result<()>;

    /// Blank the matrix
    fn clear(&mut self) -> Result<()>;
}
