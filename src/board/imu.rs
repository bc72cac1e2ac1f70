//! # IMU Module
//!
//! This module handles the Sense HAT LSM9DS1 inertial module over I2C
//! using `rppal`.
//!
//! ## Device Layout
//!
//! The LSM9DS1 exposes two dies on the bus:
//! - Accelerometer/gyroscope at address 0x6a
//! - Magnetometer at address 0x1c
//!
//! Both are probed via their WHO_AM_I registers before the board is
//! considered present, so a missing or foreign board resolves to a
//! degraded capability mode instead of garbage readings.

use rppal::i2c::I2c;
use tracing::{debug, info};

use super::{OrientationReading, SensorBoard};
use crate::error::{AstroLoggerError, Result};

/// I2C address of the accelerometer/gyroscope die
const ADDR_AG: u16 = 0x6a;

/// I2C address of the magnetometer die
const ADDR_MAG: u16 = 0x1c;

/// WHO_AM_I register, same offset on both dies
const WHO_AM_I: u8 = 0x0f;

/// Expected WHO_AM_I response from the accel/gyro die
const WHO_AM_I_AG_VALUE: u8 = 0x68;

/// Expected WHO_AM_I response from the magnetometer die
const WHO_AM_I_MAG_VALUE: u8 = 0x3d;

/// Gyroscope control: 119 Hz output, 245 dps full scale
const CTRL_REG1_G: u8 = 0x10;
const CTRL_REG1_G_VALUE: u8 = 0x60;

/// Accelerometer control: 119 Hz output, +/-2 g full scale
const CTRL_REG6_XL: u8 = 0x20;
const CTRL_REG6_XL_VALUE: u8 = 0x60;

/// Magnetometer control: ultra-high performance XY, 10 Hz output
const CTRL_REG1_M: u8 = 0x20;
const CTRL_REG1_M_VALUE: u8 = 0x70;

/// Magnetometer full scale: +/-4 gauss
const CTRL_REG2_M: u8 = 0x21;
const CTRL_REG2_M_VALUE: u8 = 0x00;

/// Magnetometer mode: continuous conversion
const CTRL_REG3_M: u8 = 0x22;
const CTRL_REG3_M_VALUE: u8 = 0x00;

/// First gyroscope output register (auto-incrementing)
const OUT_X_L_G: u8 = 0x18;

/// First accelerometer output register (auto-incrementing)
const OUT_X_L_XL: u8 = 0x28;

/// First magnetometer output register; bit 7 enables auto-increment
const OUT_X_L_M: u8 = 0x28 | 0x80;

/// Gyroscope sensitivity at 245 dps, in degrees per second per LSB
const GYRO_SENSITIVITY_DPS: f64 = 0.00875;

/// Accelerometer sensitivity at +/-2 g, in g per LSB
const ACCEL_SENSITIVITY_G: f64 = 0.000061;

/// Magnetometer sensitivity at +/-4 gauss, in microteslas per LSB
const MAG_SENSITIVITY_UT: f64 = 0.014;

/// Sense HAT LSM9DS1 handle
///
/// Holds one bus handle per die for the session lifetime; the sample loop
/// is the only reader.
pub struct Lsm9ds1 {
    ag: I2c,
    mag: I2c,
}

impl std::fmt::Debug for Lsm9ds1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lsm9ds1").finish_non_exhaustive()
    }
}

impl Lsm9ds1 {
    /// Probe and configure the IMU.
    ///
    /// # Errors
    ///
    /// Returns `Sensor` if the I2C bus cannot be opened, either die does
    /// not answer its WHO_AM_I, or configuration writes fail. The caller
    /// treats this as capability absence, not a fatal fault.
    pub fn open() -> Result<Self> {
        let mut ag = Self::open_die(ADDR_AG, WHO_AM_I_AG_VALUE)?;
        let mut mag = Self::open_die(ADDR_MAG, WHO_AM_I_MAG_VALUE)?;

        Self::write_register(&mut ag, CTRL_REG1_G, CTRL_REG1_G_VALUE)?;
        Self::write_register(&mut ag, CTRL_REG6_XL, CTRL_REG6_XL_VALUE)?;
        Self::write_register(&mut mag, CTRL_REG1_M, CTRL_REG1_M_VALUE)?;
        Self::write_register(&mut mag, CTRL_REG2_M, CTRL_REG2_M_VALUE)?;
        Self::write_register(&mut mag, CTRL_REG3_M, CTRL_REG3_M_VALUE)?;

        info!("LSM9DS1 detected and configured (119Hz, 245dps, 2g, 4gauss)");
        Ok(Self { ag, mag })
    }

    /// Open one die and verify its identity register
    fn open_die(address: u16, expected_id: u8) -> Result<I2c> {
        let mut i2c = I2c::new()
            .map_err(|e| AstroLoggerError::Sensor(format!("failed to open I2C bus: {e}")))?;
        i2c.set_slave_address(address)
            .map_err(|e| AstroLoggerError::Sensor(format!("failed to address 0x{address:02x}: {e}")))?;

        let mut id = [0u8; 1];
        i2c.write_read(&[WHO_AM_I], &mut id)
            .map_err(|e| AstroLoggerError::Sensor(format!("no response from 0x{address:02x}: {e}")))?;
        debug!("WHO_AM_I at 0x{:02x}: 0x{:02x}", address, id[0]);

        if id[0] != expected_id {
            return Err(AstroLoggerError::Sensor(format!(
                "unexpected WHO_AM_I 0x{:02x} at address 0x{:02x} (expected 0x{:02x})",
                id[0], address, expected_id
            )));
        }
        Ok(i2c)
    }

    fn write_register(i2c: &mut I2c, register: u8, value: u8) -> Result<()> {
        i2c.write(&[register, value])
            .map(|_| ())
            .map_err(|e| AstroLoggerError::Sensor(format!("register write 0x{register:02x} failed: {e}")))
    }

    /// Read six output bytes starting at `register` as three little-endian
    /// signed 16-bit axis values
    fn read_axes(i2c: &mut I2c, register: u8) -> Result<[i16; 3]> {
        let mut raw = [0u8; 6];
        i2c.write_read(&[register], &mut raw)
            .map_err(|e| AstroLoggerError::Sensor(format!("axis read 0x{register:02x} failed: {e}")))?;
        Ok([
            i16::from_le_bytes([raw[0], raw[1]]),
            i16::from_le_bytes([raw[2], raw[3]]),
            i16::from_le_bytes([raw[4], raw[5]]),
        ])
    }

    fn scale(raw: [i16; 3], sensitivity: f64) -> [f64; 3] {
        [
            f64::from(raw[0]) * sensitivity,
            f64::from(raw[1]) * sensitivity,
            f64::from(raw[2]) * sensitivity,
        ]
    }
}

impl SensorBoard for Lsm9ds1 {
    fn read_orientation(&mut self) -> Result<OrientationReading> {
        let gyro_raw = Self::read_axes(&mut self.ag, OUT_X_L_G)?;
        let accel_raw = Self::read_axes(&mut self.ag, OUT_X_L_XL)?;
        let mag_raw = Self::read_axes(&mut self.mag, OUT_X_L_M)?;

        let gyro_dps = Self::scale(gyro_raw, GYRO_SENSITIVITY_DPS);
        Ok(OrientationReading {
            magnetometer: Self::scale(mag_raw, MAG_SENSITIVITY_UT),
            gyroscope: [
                gyro_dps[0].to_radians(),
                gyro_dps[1].to_radians(),
                gyro_dps[2].to_radians(),
            ],
            accelerometer: Self::scale(accel_raw, ACCEL_SENSITIVITY_G),
        })
    }
}
