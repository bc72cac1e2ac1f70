//! # LED Matrix Module
//!
//! This module handles the Sense HAT 8x8 LED matrix through its Linux
//! framebuffer device.
//!
//! The kernel exposes the matrix as a 128-byte RGB565 framebuffer named
//! `RPi-Sense FB`. Discovery scans `/sys/class/graphics/fb*/name` rather
//! than assuming `/dev/fb0`, since the Pi's HDMI framebuffer usually
//! occupies the first slot.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{LedMatrix, Rgb, MATRIX_CELLS, MATRIX_SIZE};
use crate::error::{AstroLoggerError, Result};

/// Framebuffer name registered by the Sense HAT kernel driver
const SENSE_FB_NAME: &str = "RPi-Sense FB";

/// Directory listing all framebuffer devices
const GRAPHICS_CLASS_DIR: &str = "/sys/class/graphics";

/// Bytes per cell (RGB565)
const BYTES_PER_PIXEL: usize = 2;

/// Pack one cell into little-endian RGB565, dimming first in low-light mode
fn pack((r, g, b): Rgb, low_light: bool) -> [u8; BYTES_PER_PIXEL] {
    let (r, g, b) = if low_light {
        (r >> 2, g >> 2, b >> 2)
    } else {
        (r, g, b)
    };
    let rgb565: u16 = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
    rgb565.to_le_bytes()
}

/// Sense HAT LED matrix handle
pub struct SenseFb {
    fb: File,
    device_path: String,
    low_light: bool,
}

impl std::fmt::Debug for SenseFb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseFb")
            .field("device_path", &self.device_path)
            .field("low_light", &self.low_light)
            .finish_non_exhaustive()
    }
}

impl SenseFb {
    /// Find and open the Sense HAT framebuffer.
    ///
    /// With `low_light` set, every channel is dimmed before packing; the
    /// ISS flight units require reduced matrix brightness.
    ///
    /// # Errors
    ///
    /// Returns `Display` if no framebuffer is named `RPi-Sense FB` or the
    /// device node cannot be opened for writing. The caller treats this as
    /// capability absence.
    pub fn open(low_light: bool) -> Result<Self> {
        let class_dir = Path::new(GRAPHICS_CLASS_DIR);
        if !class_dir.exists() {
            return Err(AstroLoggerError::Display(format!(
                "{GRAPHICS_CLASS_DIR} not found"
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(class_dir)
            .map_err(|e| AstroLoggerError::Display(format!("failed to read {GRAPHICS_CLASS_DIR}: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AstroLoggerError::Display(format!("failed to read directory entry: {e}")))?;

        // Sorted for deterministic selection
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !name.starts_with("fb") {
                continue;
            }

            let registered = fs::read_to_string(path.join("name")).unwrap_or_default();
            debug!("framebuffer {}: {}", name, registered.trim());
            if registered.trim() != SENSE_FB_NAME {
                continue;
            }

            let device_path = format!("/dev/{name}");
            let fb = OpenOptions::new()
                .write(true)
                .open(&device_path)
                .map_err(|e| AstroLoggerError::Display(format!("failed to open {device_path}: {e}")))?;

            info!("Sense HAT LED matrix at {}", device_path);
            return Ok(Self {
                fb,
                device_path,
                low_light,
            });
        }

        Err(AstroLoggerError::Display(format!(
            "no framebuffer named '{SENSE_FB_NAME}' found"
        )))
    }

    /// Device node backing this matrix
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.fb
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.fb.write_all(data))
            .map_err(|e| AstroLoggerError::Display(format!("framebuffer write failed: {e}")))
    }
}

impl LedMatrix for SenseFb {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        if x >= MATRIX_SIZE || y >= MATRIX_SIZE {
            return Err(AstroLoggerError::Display(format!(
                "cell ({x},{y}) outside the {MATRIX_SIZE}x{MATRIX_SIZE} matrix"
            )));
        }
        let packed = pack(color, self.low_light);
        let offset = ((y * MATRIX_SIZE + x) * BYTES_PER_PIXEL) as u64;
        self.write_at(offset, &packed)
    }

    fn set_pixels(&mut self, pixels: &[Rgb; MATRIX_CELLS]) -> Result<()> {
        let mut image = [0u8; MATRIX_CELLS * BYTES_PER_PIXEL];
        for (cell, color) in pixels.iter().enumerate() {
            let packed = pack(*color, self.low_light);
            image[cell * BYTES_PER_PIXEL] = packed[0];
            image[cell * BYTES_PER_PIXEL + 1] = packed[1];
        }
        self.write_at(0, &image)
    }

    fn clear(&mut self) -> Result<()> {
        self.set_pixels(&[(0, 0, 0); MATRIX_CELLS])
    }
}
