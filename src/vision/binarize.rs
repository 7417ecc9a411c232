//! Raw intensities to a dark/light mask.
//!
//! An element is dark when its raw value is strictly below the cutoff. The
//! cutoff is either a fraction `t` of the window's dynamic range
//! (`min + (max - min) * t`, see [`binarize`]) or an absolute intensity
//! ([`binarize_at`]).
//!
//! Both functions rewrite the whole mask: elements outside the active window
//! are reset to light, so nothing from an earlier call leaks through.

use crate::sensor::frame::{Frame, Mask};

use super::{stats::FrameStats, window::Window};

/// Binarizes `frame` at threshold fraction `t` of the range in `stats`.
pub fn binarize(frame: &Frame, stats: &FrameStats, t: f32, window: Window, mask: &mut Mask) {
    binarize_at(frame, stats.cutoff(t), window, mask);
}

/// Binarizes `frame` against an absolute intensity `cutoff`.
pub fn binarize_at(frame: &Frame, cutoff: f32, window: Window, mask: &mut Mask) {
    mask.reset(frame.len());
    for i in window.indices() {
        if let Some(sample) = frame.get(i) {
            mask.set(i, (sample as f32) < cutoff);
        }
    }
}
