//! # Time Source Module
//!
//! Wraps "now" acquisition and timestamp formatting behind a single
//! strategy value selected once at startup and never changed mid-run.
//!
//! Two strategies exist:
//! - **Coarse**: the system wall clock, rendered in local time. Used when
//!   the position estimator is unavailable and nothing depends on a
//!   particular timescale.
//! - **Ephemeris**: the UTC timescale the SGP4 propagator works in.
//!   Formatting stays in UTC so the recorded timestamps are consistent with
//!   the coordinate calculation they fence.
//!
//! There is no per-call error path; a strategy that cannot be established
//! is resolved by the capability probe before the loop starts.

use chrono::{DateTime, Duration, Local, Utc};

use crate::source::Mode;

/// Fixed timestamp pattern: `YYYY-MM-DD_HH.MM.SS.ffffff`
pub const TIMESTAMP_PATTERN: &str = "%Y-%m-%d_%H.%M.%S.%6f";

/// Maximum rendered timestamp length in characters
pub const TIMESTAMP_MAX_LEN: usize = 30;

/// Timestamp acquisition and formatting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// System wall clock, local-time formatting
    Coarse,
    /// Estimator timescale (UTC), UTC formatting
    Ephemeris,
}

impl TimeSource {
    /// Select the strategy matching the probed capability mode.
    ///
    /// Any mode that queries the position estimator must stamp samples in
    /// the estimator's own timescale.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::SensorOnly => TimeSource::Coarse,
            Mode::FullHardware | Mode::PositionOnly => TimeSource::Ephemeris,
        }
    }

    /// Current instant.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Render an instant with the fixed pattern, capped at
    /// [`TIMESTAMP_MAX_LEN`] characters.
    pub fn format(&self, at: DateTime<Utc>) -> String {
        let mut rendered = match self {
            TimeSource::Coarse => at
                .with_timezone(&Local)
                .format(TIMESTAMP_PATTERN)
                .to_string(),
            TimeSource::Ephemeris => at.format(TIMESTAMP_PATTERN).to_string(),
        };
        rendered.truncate(TIMESTAMP_MAX_LEN);
        rendered
    }

    /// Time elapsed since `earlier`.
    pub fn elapsed_since(&self, earlier: DateTime<Utc>) -> Duration {
        self.now() - earlier
    }
}
