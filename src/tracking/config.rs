//! Tracking configuration and its validation.
//!
//! All values here are fixed for the lifetime of a
//! [`LineTracker`](crate::tracking::estimator::LineTracker). Two profiles are
//! provided:
//!
//! - [`TrackingConfig::dynamic`] (the default): sweeps both exposure and
//!   threshold during calibration, adapts the threshold every cycle and flags
//!   lighting drift as [`HighDynamicRange`](crate::tracking::estimator::TrackingStatus::HighDynamicRange).
//! - [`TrackingConfig::fixed_window`]: a narrower exposure sweep with no
//!   threshold search. Calibration splits each frame at its midpoint and
//!   cycles split at the calibrated reference intensity.
//!
//! # Example
//!
//! ```
//! use linetrack::tracking::config::{PlatformRule, TrackingConfig};
//!
//! let mut config = TrackingConfig::dynamic();
//! config.platform = PlatformRule::SolidRatio(0.4);
//! assert!(config.validate().is_ok());
//! ```

use log::error;
use thiserror::Error;

use crate::{
    sensor::frame::{MAX_PIXELS, Sample},
    vision::window::Window,
};

/// The largest number of exposure trials a calibration can run.
pub const MAX_TRIALS: usize = 32;

/// Configuration mistakes. These are detected before the first calibration
/// and cannot be recovered from at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pixel count {0} is outside 1..={max}", max = MAX_PIXELS)]
    PixelCount(usize),
    #[error("active window [{start}, {end}] is empty")]
    EmptyWindow { start: usize, end: usize },
    #[error("active window [{start}, {end}] must lie strictly inside 0..{pixel_count}")]
    WindowOutOfRange { start: usize, end: usize, pixel_count: usize },
    #[error("minimum track width must be at least one pixel")]
    ZeroTrackWidth,
    #[error("active window of {window} pixels cannot hold a track of {min_width} pixels")]
    WindowTooNarrow { window: usize, min_width: usize },
    #[error("exposure range {start_ms}..={end_ms} ms is empty")]
    EmptyExposureRange { start_ms: u32, end_ms: u32 },
    #[error("exposure step must be positive")]
    ZeroExposureStep,
    #[error("{count} exposure trials exceed the limit of {max}", max = MAX_TRIALS)]
    TooManyTrials { count: usize },
    #[error("threshold step {0} is outside (0, 1]")]
    ThresholdStep(f32),
    #[error("{name} = {value} is out of range")]
    Parameter { name: &'static str, value: f32 },
    #[error("dynamic range bounds {low}..={high} are out of order or outside [0, 1]")]
    DynamicRangeBounds { low: f32, high: f32 },
    #[error("output resolution must be positive")]
    ZeroResolution,
}

/// The exposure times tried during calibration: `start_ms`, `start_ms + step_ms`, ... `<= end_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureSweep {
    pub start_ms: u32,
    pub end_ms:   u32,
    pub step_ms:  u32,
}

impl ExposureSweep {
    pub fn new(start_ms: u32, end_ms: u32, step_ms: u32) -> Self {
        Self {
            start_ms,
            end_ms,
            step_ms,
        }
    }

    /// Number of exposure times in the sweep.
    pub fn trial_count(&self) -> usize {
        if self.step_ms == 0 || self.end_ms < self.start_ms {
            return 0;
        }
        ((self.end_ms - self.start_ms) / self.step_ms + 1) as usize
    }

    /// Exposure times in ascending order.
    pub fn times(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.trial_count()).map(move |i| self.start_ms + self.step_ms * i as u32)
    }
}

/// How a threshold is chosen for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdSearch {
    /// Try increasing fractions `step` apart until a track appears.
    Sweep { step: f32 },
    /// A single attempt at the middle of the frame's range.
    Midpoint,
    /// A single attempt at the reference average intensity.
    ///
    /// Calibration has no reference yet and tries the midpoint instead.
    ReferenceCutoff,
}

/// Which exposure trial calibration keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialSelection {
    /// The trial whose track appeared at the smallest threshold.
    LowestThreshold,
    /// The trial with the smallest min/max contrast.
    LowestContrast,
}

/// Bounds of the high-dynamic-range test.
///
/// A track found at a threshold above `clamp(last * gain, low, high)` is
/// flagged, where `last` is the threshold the cycle started from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicRangeBounds {
    pub gain: f32,
    pub low:  f32,
    pub high: f32,
}

impl DynamicRangeBounds {
    /// The largest threshold still considered normal after `last`.
    pub fn limit(&self, last: f32) -> f32 { (last * self.gain).clamp(self.low, self.high) }
}

/// Bounds of the blocked-sensor test run after calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockedBounds {
    /// Minimum observed contrast below which the sensor may be covered.
    pub low_contrast: f32,
    /// Spread between the largest and smallest contrast that confirms it.
    pub spread:       f32,
}

/// When a cycle reports that the sensor sits over a large solid dark area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformRule {
    /// Current average divided by the reference average falls below the ratio.
    SolidRatio(f32),
    /// More than this fraction of the active window binarizes dark.
    DarkFraction(f32),
}

/// Exposure time used by steady-state cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleExposure {
    /// Always `nominal_exposure_ms`.
    Nominal,
    /// The exposure calibration selected, or `nominal_exposure_ms` until a
    /// calibration succeeds.
    Calibrated,
}

/// What happens to the reference average after a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePolicy {
    /// The reference follows the latest successful cycle's average.
    Drift,
    /// The reference stays at the calibrated value.
    Fixed,
}

/// Complete configuration of a line tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Number of sensor elements per frame.
    pub pixel_count:         usize,
    /// Largest sample the converter can report.
    pub sample_max:          Sample,
    /// Elements used for statistics and detection.
    pub window:              Window,
    /// Minimum run of dark elements accepted as a track.
    pub min_track_width:     usize,
    /// Upper end of the reported position scale (`0..=output_resolution`).
    pub output_resolution:   u16,
    /// Exposure times tried by calibration.
    pub exposure:            ExposureSweep,
    /// Cycle exposure before calibration, or always with [`CycleExposure::Nominal`].
    pub nominal_exposure_ms: u32,
    pub cycle_exposure:      CycleExposure,
    /// Capture twice per cycle and keep the second frame.
    pub flush_capture:       bool,
    /// Threshold search during calibration.
    pub calibration_search:  ThresholdSearch,
    /// Threshold search during cycles.
    pub cycle_search:        ThresholdSearch,
    pub selection:           TrialSelection,
    pub dynamic_range:       DynamicRangeBounds,
    pub blocked:             BlockedBounds,
    pub platform:            PlatformRule,
    pub baseline:            BaselinePolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self { Self::dynamic() }
}

impl TrackingConfig {
    /// Exposure and threshold sweeps with adaptive per-cycle thresholds.
    pub fn dynamic() -> Self {
        Self {
            pixel_count:         128,
            sample_max:          4095,
            window:              Window::new(15, 126),
            min_track_width:     10,
            output_resolution:   128,
            exposure:            ExposureSweep::new(60, 140, 10),
            nominal_exposure_ms: 10,
            cycle_exposure:      CycleExposure::Calibrated,
            flush_capture:       true,
            calibration_search:  ThresholdSearch::Sweep { step: 0.01 },
            cycle_search:        ThresholdSearch::Sweep { step: 0.1 },
            selection:           TrialSelection::LowestThreshold,
            dynamic_range:       DynamicRangeBounds {
                gain: 10.0,
                low:  0.3,
                high: 0.8,
            },
            blocked:             BlockedBounds {
                low_contrast: 0.02,
                spread:       0.6,
            },
            platform:            PlatformRule::SolidRatio(0.5),
            baseline:            BaselinePolicy::Drift,
        }
    }

    /// Exposure sweep only; frames are split at their midpoint during
    /// calibration and at the reference intensity during cycles.
    pub fn fixed_window() -> Self {
        Self {
            exposure: ExposureSweep::new(10, 80, 10),
            calibration_search: ThresholdSearch::Midpoint,
            cycle_search: ThresholdSearch::ReferenceCutoff,
            selection: TrialSelection::LowestContrast,
            platform: PlatformRule::DarkFraction(0.7),
            ..Self::dynamic()
        }
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check().inspect_err(|e| error!("Invalid tracking configuration: {}", e))
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.pixel_count == 0 || self.pixel_count > MAX_PIXELS {
            return Err(ConfigError::PixelCount(self.pixel_count));
        }

        let Window { start, end } = self.window;
        if self.window.is_empty() || start == end {
            return Err(ConfigError::EmptyWindow { start, end });
        }
        if start == 0 || end + 1 >= self.pixel_count {
            return Err(ConfigError::WindowOutOfRange {
                start,
                end,
                pixel_count: self.pixel_count,
            });
        }

        if self.min_track_width == 0 {
            return Err(ConfigError::ZeroTrackWidth);
        }
        if self.window.len() < self.min_track_width {
            return Err(ConfigError::WindowTooNarrow {
                window:    self.window.len(),
                min_width: self.min_track_width,
            });
        }

        if self.exposure.step_ms == 0 {
            return Err(ConfigError::ZeroExposureStep);
        }
        if self.exposure.end_ms < self.exposure.start_ms {
            return Err(ConfigError::EmptyExposureRange {
                start_ms: self.exposure.start_ms,
                end_ms:   self.exposure.end_ms,
            });
        }
        let count = self.exposure.trial_count();
        if count > MAX_TRIALS {
            return Err(ConfigError::TooManyTrials { count });
        }

        for search in [self.calibration_search, self.cycle_search] {
            if let ThresholdSearch::Sweep { step } = search {
                if !(step.is_finite() && step > 0.0 && step <= 1.0) {
                    return Err(ConfigError::ThresholdStep(step));
                }
            }
        }

        let DynamicRangeBounds { gain, low, high } = self.dynamic_range;
        check_parameter("dynamic_range.gain", gain)?;
        if !(low.is_finite() && high.is_finite() && 0.0 <= low && low <= high && high <= 1.0) {
            return Err(ConfigError::DynamicRangeBounds { low, high });
        }

        check_parameter("blocked.low_contrast", self.blocked.low_contrast)?;
        check_parameter("blocked.spread", self.blocked.spread)?;

        match self.platform {
            PlatformRule::SolidRatio(ratio) => check_parameter("platform.solid_ratio", ratio)?,
            PlatformRule::DarkFraction(fraction) => {
                check_parameter("platform.dark_fraction", fraction)?;
                if fraction > 1.0 {
                    return Err(ConfigError::Parameter {
                        name:  "platform.dark_fraction",
                        value: fraction,
                    });
                }
            }
        }

        if self.output_resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        Ok(())
    }
}

fn check_parameter(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Parameter { name, value })
    }
}
