//! Console and file logger for tracking sessions.
//!
//! This module implements the [`log`] crate's logging facade, writing every
//! record both to standard output and to a log file, so a calibration run on
//! the bench can be read back after the fact.
//!
//! # Usage
//!
//! Initialize the logger once at the start of your program:
//!
//! ```no_run
//! use linetrack::fs::logger;
//! use log::{LevelFilter, info};
//!
//! logger::init(LevelFilter::Debug).expect("Logger init failed");
//! info!("Line follower started");
//! ```
//!
//! # Log Output
//!
//! Each entry holds the level, the time since the logger was created, the
//! target (module path) and the message:
//!
//! ```text
//! INFO [1s 204ms] linetrack::tracking::estimator - Calibrated: exposure 60 ms, threshold 0.01, reference 1100, contrast 0.134
//! WARN [3s 17ms] linetrack::sensor::camera - Capture returned 96 samples, expected 128
//! ```

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
    sync::{Mutex, OnceLock},
    time::{Duration, Instant},
};

use humantime::{FormattedDuration, format_duration};
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "linetrack.log";

/// A dual-output logger.
///
/// The file is created or truncated when the logger is built.
pub struct TrackLogger {
    /// `None` if the file could not be opened; console output continues.
    file_writer: Mutex<Option<BufWriter<std::fs::File>>>,
    started:     Instant,
}

impl TrackLogger {
    fn new(path: &Path) -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
            started:     Instant::now(),
        }
    }

    /// Time since the logger was created, truncated to milliseconds.
    fn elapsed(&self) -> FormattedDuration {
        let millis = self.started.elapsed().as_millis() as u64;
        format_duration(Duration::from_millis(millis))
    }
}

impl log::Log for TrackLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_line = format!(
                "{} [{}] {} - {}\n",
                record.level(),
                self.elapsed(),
                record.target(),
                record.args()
            );

            print!("{}", log_line);

            if let Ok(mut writer_guard) = self.file_writer.lock() {
                if let Some(ref mut writer) = *writer_guard {
                    let _ = writer.write_all(log_line.as_bytes());
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.flush();
            }
        }
    }
}

static LOGGER: OnceLock<TrackLogger> = OnceLock::new();

/// Installs the logger, writing to [`DEFAULT_LOG_FILE`].
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    init_with_path(level, DEFAULT_LOG_FILE)
}

/// Installs the logger, writing to `path`.
///
/// Only the first call in a process picks the file; later calls fail with
/// [`SetLoggerError`] like any second logger would.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init_with_path(level: LevelFilter, path: impl AsRef<Path>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| TrackLogger::new(path.as_ref()));
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

#[cfg(test)]
mod tests {
    use log::{LevelFilter, debug, error, info, trace, warn};

    #[test]
    #[ignore = "filesystem access needed (file write)"]
    fn log_full_test() {
        let path = std::env::temp_dir().join("linetrack-logger-test.log");
        super::init_with_path(LevelFilter::Trace, &path).expect("Failed to initialize logger");

        trace!("This is a trace message");
        debug!("This is a debug message");
        info!("This is an info message");
        warn!("This is a warning message");
        error!("This is an error message");

        log::logger().flush();

        let written = std::fs::read_to_string(&path).expect("log file missing");
        let ours: Vec<&str> = written
            .lines()
            .filter(|l| l.contains("linetrack::fs::logger::tests - This is"))
            .collect();
        assert_eq!(ours.len(), 5);
        assert!(ours[0].starts_with("TRACE ["));
    }
}
