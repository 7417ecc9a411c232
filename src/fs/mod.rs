//! Filesystem utilities.
//!
//! # Logging
//!
//! The `logger` submodule provides a logger that writes to the console and
//! to `linetrack.log`. This is useful for reading back calibration trials
//! and status changes after a run.
//!
//! # Example
//!
//! ```no_run
//! use linetrack::fs::logger;
//! use log::{LevelFilter, info};
//!
//! // Initialize the logger at program start
//! logger::init(LevelFilter::Debug).expect("Failed to initialize logger");
//!
//! // Now you can use standard logging macros
//! info!("Tracker initialized successfully");
//! ```

/// Console and file logging.
///
/// Provides a logger implementation that writes to both the console
/// and a log file.
pub mod logger;
