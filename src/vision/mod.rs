//! Per-frame line detection.
//!
//! Everything in this module is a pure function of one captured frame and
//! fixed configuration; nothing here carries state between frames.
//!
//! # Pipeline
//!
//! 1. **[`stats`]**: Min/max/average intensity over the active window.
//! 2. **[`binarize`]**: Split the frame into dark and light at a threshold.
//! 3. **[`extract`]**: Find the track's edges and midpoint in the mask.
//! 4. **[`sweep`]**: Repeat 2-3 at increasing thresholds until a track shows up.
//!
//! # Example
//!
//! ```
//! use linetrack::sensor::frame::{Frame, Mask};
//! use linetrack::vision::{stats::FrameStats, sweep::Scan, window::Window};
//!
//! let samples: Vec<u16> = (0..128).map(|i| if (60..=75).contains(&i) { 50 } else { 200 }).collect();
//! let frame = Frame::from_samples(&samples).unwrap();
//! let window = Window::new(15, 126);
//! let stats = FrameStats::measure(&frame, window);
//!
//! let scan = Scan { frame: &frame, stats: &stats, window, min_width: 10 };
//! let mut mask = Mask::new();
//! let span = scan.at_fraction(0.5, &mut mask).unwrap();
//! assert_eq!((span.left, span.right, span.mid), (60, 75, 68));
//! ```

/// Frame to dark/light mask conversion.
pub mod binarize;

/// Track edge and midpoint extraction.
pub mod extract;

/// Intensity statistics.
pub mod stats;

/// Threshold search.
pub mod sweep;

/// The active sensing window.
pub mod window;
