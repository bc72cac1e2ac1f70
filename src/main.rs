//! # AstroLogger
//!
//! Fixed-duration telemetry logger for an AstroPi-class Raspberry Pi.
//!
//! Samples the Sense HAT magnetometer, gyroscope and accelerometer
//! together with an SGP4 estimate of the ISS sub-point at a fixed
//! cadence, appends every sample to a CSV record file, and animates an
//! orbit-progress indicator on the 8x8 LED matrix.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (TOML file, or built-in defaults)
//!    - Set up logging to stdout and the events log file
//!    - Probe capabilities once: sensor board, orbital elements
//!    - Create the record file with the mode's column schema
//!
//! 2. **Main Loop**
//!    - One sample per tick for the configured duration (178 minutes by
//!      default), 500 ms sleep between ticks
//!    - Per-tick faults are logged and contained; the loop never stops
//!      early because of them
//!    - Progress indicator advances every 25th tick
//!
//! 3. **Shutdown**
//!    - Session completes when the duration elapses; Ctrl+C interrupts
//!    - Final log marker, LED matrix cleared
//!
//! # Errors
//!
//! Exits with an error only for construction faults: invalid
//! configuration, or no data source available at all.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use astro_logger::board::led::SenseFb;
use astro_logger::clock::TimeSource;
use astro_logger::config::Config;
use astro_logger::indicator::ProgressIndicator;
use astro_logger::record::RecordWriter;
use astro_logger::session::Session;
use astro_logger::source::DataSource;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)?;

    // Everything the loop logs goes to stdout and to the events file
    let log_path = Path::new(&config.run.log_file);
    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let log_name = log_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "events.log".into());
    let appender = tracing_appender::rolling::never(log_dir, log_name);
    let (file_writer, _guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    info!("AstroLogger v{} starting...", env!("CARGO_PKG_VERSION"));

    let source = DataSource::probe(&config)?;
    let mode = source.mode();
    let clock = TimeSource::for_mode(mode);
    let writer = RecordWriter::create(&config.record.data_file, mode);

    let indicator = if config.display.enabled {
        match SenseFb::open(config.display.low_light) {
            Ok(matrix) => match ProgressIndicator::new(Box::new(matrix)) {
                Ok(indicator) => Some(indicator),
                Err(e) => {
                    warn!("failed to initialize progress indicator: {e}");
                    None
                }
            },
            Err(e) => {
                info!("LED matrix unavailable, running without indicator: {e}");
                None
            }
        }
    } else {
        None
    };

    let mut session = Session::new(clock, source, writer, indicator, &config);

    info!("Press Ctrl+C to exit");
    let interrupted = tokio::select! {
        result = session.run() => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        info!("Received Ctrl+C, shutting down...");
        session.clear_display();
    }

    info!("session finished after {} iterations", session.counter());
    Ok(())
}
