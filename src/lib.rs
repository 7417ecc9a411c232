//! # Linetrack
//!
//! Linetrack estimates the lateral position of a dark line under a linear
//! optical sensor array (a 128-element CCD on a line-following vehicle) once
//! per control cycle. It provides:
//!
//! - **Calibration**: An exposure sweep that, at every exposure time, searches
//!   for the lowest threshold that reveals the line, then keeps the cleanest
//!   operating point and checks whether the sensor is covered.
//! - **Tracking**: A per-cycle estimator that binarizes each frame, extracts
//!   the line's edges and midpoint and classifies the cycle as normal, high
//!   dynamic range, no track or platform.
//! - **Sensors**: A [`LineCamera`](sensor::camera::LineCamera) trait for the
//!   hardware boundary, with simulated and replay cameras for tests and bring-up.
//! - **Diagnostics**: Per-cycle observers and one-line text dumps of frames.
//! - **Logging**: A console and file logger for the [`log`] facade.
//!
//! ## Quick Start
//!
//! ```
//! use linetrack::sensor::simulated::SimulatedCamera;
//! use linetrack::tracking::{config::TrackingConfig, estimator::{LineTracker, TrackingStatus}};
//!
//! let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
//! let mut tracker = LineTracker::new(TrackingConfig::default()).unwrap();
//!
//! let calibration = tracker.calibrate(&mut camera).unwrap();
//! assert!(!calibration.blocked);
//!
//! for _ in 0..3 {
//!     let report = tracker.cycle(&mut camera).unwrap();
//!     match report.status {
//!         TrackingStatus::Normal | TrackingStatus::HighDynamicRange => {
//!             let position = report.position.unwrap();
//!             assert!((50..=70).contains(&position));
//!         }
//!         TrackingStatus::NoTrack | TrackingStatus::Platform => {}
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sensor`]: Frames, masks and the camera boundary.
//! - [`vision`]: Stateless per-frame detection.
//! - [`tracking`]: Calibration, the estimator and diagnostics.
//! - [`fs`]: Filesystem utilities including logging.

/// Filesystem utilities module.
///
/// Contains logging functionality for recording calibration trials and
/// status changes to the console and a log file.
pub mod fs;

/// Sensor data and the camera boundary.
///
/// Provides fixed-capacity [`Frame`](sensor::frame::Frame) and
/// [`Mask`](sensor::frame::Mask) buffers, the
/// [`LineCamera`](sensor::camera::LineCamera) trait and software cameras:
///
/// - **Simulated**: Renders a floor and a stripe and integrates it over the
///   requested exposure.
/// - **Replay**: Plays back recorded frames.
pub mod sensor;

/// Line tracking module.
///
/// Builds the stateful estimator on top of [`vision`]:
///
/// - **Configuration**: The `dynamic` and `fixed_window` profiles and their
///   validation.
/// - **Calibration**: Exposure/threshold sweep and blocked-sensor detection.
/// - **Estimation**: Per-cycle position and status.
/// - **Diagnostics**: Observers and text dumps.
pub mod tracking;

/// Per-frame detection module.
///
/// Pure functions of one frame: window statistics, binarization, track
/// extraction and bounded threshold sweeps.
pub mod vision;
