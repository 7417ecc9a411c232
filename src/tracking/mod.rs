//! Calibration and steady-state line tracking.
//!
//! This module turns the stateless detection in [`vision`](crate::vision)
//! into a line-position estimator:
//!
//! - **[`config`]**: Fixed parameters, validated once before use.
//! - **[`calibrate`]**: Power-on exposure and threshold search, plus the
//!   blocked-sensor test.
//! - **[`estimator`]**: The per-cycle tracker and its status classification.
//! - **[`diagnostics`]**: Observers and text dumps of frames and masks.
//!
//! # Example
//!
//! ```
//! use linetrack::sensor::simulated::SimulatedCamera;
//! use linetrack::tracking::{config::TrackingConfig, diagnostics::LogDump, estimator::LineTracker};
//!
//! let mut camera = SimulatedCamera::new(128).with_track(50.0, 12.0, 0.15);
//! let mut tracker = LineTracker::new(TrackingConfig::fixed_window()).unwrap();
//! tracker.set_observer(LogDump);
//!
//! if tracker.calibrate(&mut camera).unwrap().is_usable() {
//!     let report = tracker.cycle(&mut camera).unwrap();
//!     println!("{:?} at {:?}", report.status, report.position);
//! }
//! ```

/// Exposure/threshold calibration.
pub mod calibrate;

/// Tracking parameters and profiles.
pub mod config;

/// Cycle observers and frame dumps.
pub mod diagnostics;

/// The line-position estimator.
pub mod estimator;
