//! Intensity statistics over the active window of a frame.

use crate::sensor::frame::{Frame, Sample};

use super::window::Window;

/// Minimum, maximum and mid-range intensity of one frame's active window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub min:     Sample,
    pub max:     Sample,
    /// `round((min + max) / 2)`.
    pub average: Sample,
}

impl FrameStats {
    /// Builds statistics from a known min/max pair.
    pub fn from_range(min: Sample, max: Sample) -> Self {
        let average = ((min as u32 + max as u32 + 1) / 2) as Sample;
        Self { min, max, average }
    }

    /// Measures `frame` over `window`.
    ///
    /// A window reaching past the frame is cut at the frame's last sample.
    /// If no sample of the frame falls inside the window, the statistics are
    /// all zero.
    pub fn measure(frame: &Frame, window: Window) -> Self {
        let samples = frame.as_slice();
        let end = window.end.min(samples.len().saturating_sub(1));
        let inside = samples.get(window.start..=end).unwrap_or_default();
        if inside.is_empty() {
            return Self::default();
        }

        let (min, max) = inside
            .iter()
            .fold((Sample::MAX, Sample::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        Self::from_range(min, max)
    }

    /// `min / max`. Lower means better separation between track and floor.
    ///
    /// A fully dark frame (`max == 0`) has contrast 0.
    pub fn contrast(&self) -> f32 {
        if self.max == 0 { 0.0 } else { self.min as f32 / self.max as f32 }
    }

    /// Intensity below which a sample counts as dark at threshold fraction `t`.
    pub fn cutoff(&self, t: f32) -> f32 {
        self.min as f32 + (self.max as f32 - self.min as f32) * t
    }

    /// Expresses an absolute intensity as a threshold fraction of this frame's range.
    pub fn fraction_of(&self, cutoff: f32) -> f32 {
        if self.max == self.min {
            return 0.0;
        }
        ((cutoff - self.min as f32) / (self.max as f32 - self.min as f32)).clamp(0.0, 1.0)
    }
}
