//! # Session Module
//!
//! The fixed-cadence sample loop and its lifecycle.
//!
//! A session moves `Idle -> Running -> Completed`, exactly once. Each
//! tick increments the iteration counter, advances the progress indicator
//! on its own modulus, captures a before-instant, samples the data
//! source, captures an after-instant, and appends the assembled sample to
//! the record writer. The sleep between ticks is the only suspension
//! point; acquisition, write and indicator work run strictly in order.
//!
//! The central reliability property lives at the tick boundary: any error
//! raised by acquisition, persistence or the indicator is caught there,
//! logged with its kind and message, and never terminates the loop. A
//! single faulty sensor read must never end a multi-hour unattended run.

use chrono::Duration as ChronoDuration;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::clock::TimeSource;
use crate::config::Config;
use crate::error::Result;
use crate::indicator::ProgressIndicator;
use crate::record::{RecordWriter, Sample};
use crate::source::DataSource;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
}

/// One telemetry-collection run
pub struct Session {
    clock: TimeSource,
    source: DataSource,
    writer: RecordWriter,
    indicator: Option<ProgressIndicator>,
    duration: ChronoDuration,
    sleep_interval: Duration,
    advance_interval: u64,
    progress_log_interval: u64,
    counter: u64,
    state: SessionState,
}

impl Session {
    pub fn new(
        clock: TimeSource,
        source: DataSource,
        writer: RecordWriter,
        indicator: Option<ProgressIndicator>,
        config: &Config,
    ) -> Self {
        Self {
            clock,
            source,
            writer,
            indicator,
            duration: ChronoDuration::seconds(config.run.duration_s as i64),
            sleep_interval: Duration::from_millis(config.run.sleep_ms),
            advance_interval: config.display.advance_interval,
            progress_log_interval: config.run.progress_log_interval,
            counter: 0,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Iteration count; incremented unconditionally every tick
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Run the loop until the configured duration has elapsed.
    ///
    /// Ticks until `now >= start + duration`, then transitions to
    /// Completed, logs the stop marker and blanks the indicator matrix.
    /// Individual tick failures never end the run.
    pub async fn run(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            warn!("session already ran, ignoring");
            return Ok(());
        }

        let start = self.clock.now();
        let end = start + self.duration;
        self.state = SessionState::Running;
        info!(
            "starting main loop: {} s run at {} ms cadence",
            self.duration.num_seconds(),
            self.sleep_interval.as_millis()
        );

        while self.clock.now() < end {
            self.tick();
            sleep(self.sleep_interval).await;
        }

        self.complete();
        Ok(())
    }

    /// One acquisition cycle.
    ///
    /// The counter advances unconditionally; everything else is contained
    /// so a fault in this tick leaves the next tick untouched.
    fn tick(&mut self) {
        self.counter += 1;

        if self.counter % self.advance_interval == 0 {
            if let Some(indicator) = self.indicator.as_mut() {
                if let Err(e) = indicator.advance() {
                    error!("{}: {e}", e.kind());
                }
            }
        }

        if let Err(e) = self.acquire() {
            error!("{}: {e}", e.kind());
        }

        if self.counter % self.progress_log_interval == 0 {
            info!("iteration {}", self.counter);
        }
    }

    /// Acquire one time-fenced sample and hand it to the writer.
    ///
    /// Errors propagate to the tick boundary; no partial row is written.
    fn acquire(&mut self) -> Result<()> {
        let before = self.clock.now();
        let reading = self.source.sample(before)?;
        let after = self.clock.now();

        let sample = Sample {
            before: self.clock.format(before),
            counter: self.counter,
            subpoint: reading.subpoint,
            orientation: reading.orientation,
            after: self.clock.format(after),
        };
        self.writer.append(&sample);
        Ok(())
    }

    fn complete(&mut self) {
        self.state = SessionState::Completed;
        info!("completed main loop after {} iterations", self.counter);
        self.clear_display();
    }

    /// Blank the indicator matrix; used at completion and on external
    /// shutdown.
    pub fn clear_display(&mut self) {
        if let Some(indicator) = self.indicator.as_mut() {
            if let Err(e) = indicator.clear() {
                error!("{}: {e}", e.kind());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::mocks::{MatrixOp, MockLedMatrix, MockSensorBoard};
    use crate::config::Config;
    use crate::record::SENSOR_COLUMNS;
    use crate::source::Mode;
    use tempfile::TempDir;

    fn test_config(duration_s: u64, sleep_ms: u64) -> Config {
        let mut config = Config::default();
        config.run.duration_s = duration_s;
        config.run.sleep_ms = sleep_ms;
        config.run.progress_log_interval = 100;
        config.display.advance_interval = 2;
        config
    }

    fn sensor_only_session(
        dir: &TempDir,
        fail_on: &[u64],
        indicator: Option<ProgressIndicator>,
    ) -> (Session, std::path::PathBuf) {
        let path = dir.path().join("data.csv");
        let source =
            DataSource::new(Some(Box::new(MockSensorBoard::failing_on(fail_on))), None).unwrap();
        let writer = RecordWriter::create(&path, Mode::SensorOnly);
        let session = Session::new(
            TimeSource::Coarse,
            source,
            writer,
            indicator,
            &test_config(1, 50),
        );
        (session, path)
    }

    #[test]
    fn test_counter_counts_every_tick_despite_failures() {
        let dir = TempDir::new().unwrap();
        let (mut session, path) = sensor_only_session(&dir, &[3, 7], None);

        for _ in 0..10 {
            session.tick();
        }

        assert_eq!(session.counter(), 10);

        // Ticks 3 and 7 failed, so exactly 8 rows follow the header
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], SENSOR_COLUMNS.join(","));

        // The failed iterations are absent from the counter column
        let counters: Vec<&str> = lines[1..]
            .iter()
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(counters, ["1", "2", "4", "5", "6", "8", "9", "10"]);
    }

    #[test]
    fn test_after_timestamp_never_precedes_before() {
        let dir = TempDir::new().unwrap();
        let (mut session, path) = sensor_only_session(&dir, &[], None);

        for _ in 0..5 {
            session.tick();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        for line in contents.lines().skip(1) {
            let fields: Vec<&str> = line.split(',').collect();
            let before = fields[0];
            let after = fields[fields.len() - 1];
            // The fixed pattern orders lexicographically like the instants
            assert!(after >= before, "after {after} precedes before {before}");
        }
    }

    #[test]
    fn test_indicator_advances_independently_of_sample_failures() {
        let dir = TempDir::new().unwrap();
        let mock = MockLedMatrix::new();
        let indicator = ProgressIndicator::new(Box::new(mock.clone())).unwrap();
        // Every read fails; the indicator must not care
        let (mut session, _path) =
            sensor_only_session(&dir, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], Some(indicator));

        for _ in 0..10 {
            session.tick();
        }

        // advance_interval is 2, so 5 advances of 2 pixel writes each,
        // plus the single init dot
        let pixel_writes = mock
            .recorded_ops()
            .iter()
            .filter(|op| matches!(op, MatrixOp::SetPixel(..)))
            .count();
        assert_eq!(pixel_writes, 5 * 2 + 1);
    }

    #[tokio::test]
    async fn test_run_completes_exactly_once_within_duration() {
        let dir = TempDir::new().unwrap();
        let (mut session, _path) = sensor_only_session(&dir, &[], None);
        assert_eq!(session.state(), SessionState::Idle);

        session.run().await.unwrap();
        assert_eq!(session.state(), SessionState::Completed);

        // 1 s at 50 ms cadence: the sleep bounds the tick count above,
        // processing time lowers it
        assert!(session.counter() >= 10, "counter {}", session.counter());
        assert!(session.counter() <= 21, "counter {}", session.counter());

        // A completed session does not run again
        let counter = session.counter();
        session.run().await.unwrap();
        assert_eq!(session.counter(), counter);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn test_run_clears_indicator_on_completion() {
        let dir = TempDir::new().unwrap();
        let mock = MockLedMatrix::new();
        let indicator = ProgressIndicator::new(Box::new(mock.clone())).unwrap();
        let path = dir.path().join("data.csv");
        let source = DataSource::new(Some(Box::new(MockSensorBoard::new())), None).unwrap();
        let writer = RecordWriter::create(&path, Mode::SensorOnly);
        let mut session = Session::new(
            TimeSource::Coarse,
            source,
            writer,
            Some(indicator),
            &test_config(1, 100),
        );

        session.run().await.unwrap();
        assert_eq!(*mock.recorded_ops().last().unwrap(), MatrixOp::Clear);
    }

    #[test]
    fn test_degraded_writer_keeps_the_loop_alive() {
        let source = DataSource::new(Some(Box::new(MockSensorBoard::new())), None).unwrap();
        let writer = RecordWriter::create("/nonexistent/dir/data.csv", Mode::SensorOnly);
        assert!(!writer.is_persisting());
        let mut session = Session::new(
            TimeSource::Coarse,
            source,
            writer,
            None,
            &test_config(1, 50),
        );

        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(session.counter(), 10);
    }
}
