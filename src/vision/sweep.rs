//! Bounded threshold search.
//!
//! A sweep binarizes the same frame at increasing threshold fractions until
//! the extractor accepts a track. Calibration sweeps from zero with a fine
//! step; steady-state cycles resume from the last good threshold with a
//! coarse one. Every sweep stops before `t` reaches 1.0, so its length is
//! bounded by `ceil((1 - start) / step)` attempts.

use crate::sensor::frame::{Frame, Mask};

use super::{
    binarize::{binarize, binarize_at},
    extract::{TrackSpan, extract_track},
    stats::FrameStats,
    window::Window,
};

/// A track found by a sweep or a single attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Threshold fraction at which the track appeared.
    pub threshold: f32,
    pub span:      TrackSpan,
}

/// Outcome of a sweep: the detection, if any, and how many thresholds were tried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    pub detection: Option<Detection>,
    pub attempts:  usize,
}

/// The frame-side inputs shared by every attempt of a sweep.
#[derive(Debug, Clone, Copy)]
pub struct Scan<'a> {
    pub frame:     &'a Frame,
    pub stats:     &'a FrameStats,
    pub window:    Window,
    pub min_width: usize,
}

impl Scan<'_> {
    /// Binarizes at threshold fraction `t` and runs the extractor once.
    pub fn at_fraction(&self, t: f32, mask: &mut Mask) -> Option<TrackSpan> {
        binarize(self.frame, self.stats, t, self.window, mask);
        extract_track(mask, self.frame, self.window, self.min_width)
    }

    /// Binarizes against an absolute intensity and runs the extractor once.
    pub fn at_cutoff(&self, cutoff: f32, mask: &mut Mask) -> Option<TrackSpan> {
        binarize_at(self.frame, cutoff, self.window, mask);
        extract_track(mask, self.frame, self.window, self.min_width)
    }

    /// Tries `start`, `start + step`, `start + 2 * step`, ... while below 1.0.
    ///
    /// Thresholds are computed from the step count rather than accumulated, so
    /// the tried values do not drift. A non-positive or non-finite step
    /// tries `start` once.
    pub fn sweep(&self, start: f32, step: f32, mask: &mut Mask) -> SweepResult {
        let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        let steps = if step.is_finite() && step > 0.0 {
            ((1.0 - start) / step).ceil().max(0.0) as usize
        } else {
            usize::from(start < 1.0)
        };

        for k in 0..steps {
            let t = start + k as f32 * step;
            if t >= 1.0 {
                return SweepResult {
                    detection: None,
                    attempts:  k,
                };
            }
            if let Some(span) = self.at_fraction(t, mask) {
                return SweepResult {
                    detection: Some(Detection { threshold: t, span }),
                    attempts:  k + 1,
                };
            }
        }
        SweepResult {
            detection: None,
            attempts:  steps,
        }
    }
}
