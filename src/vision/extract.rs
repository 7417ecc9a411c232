//! Track edge and midpoint extraction from a binary mask.
//!
//! The mask is scanned left to right across the active window, counting
//! consecutive dark elements. The first run that reaches the minimum track
//! width wins: its right edge is the last dark element before the next light
//! one, or the window's last element if the window ends inside the run.
//! Later runs are never looked at, even wider ones.
//!
//! # Midpoint
//!
//! When `right - left` is even the midpoint is exact. When it is odd the run
//! has two center elements, and the one with the smaller raw intensity wins
//! (the right one on a tie), pulling the estimate toward the darkest part of
//! the line.

use crate::sensor::frame::{Frame, Mask};

use super::window::Window;

/// A run of dark elements accepted as the track, in sensor index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSpan {
    /// First dark element of the run.
    pub left:  usize,
    /// Last dark element of the run.
    pub right: usize,
    /// Chosen center element.
    pub mid:   usize,
}

impl TrackSpan {
    /// Number of elements in the run.
    pub fn width(&self) -> usize { self.right - self.left + 1 }
}

/// Finds the first dark run of at least `min_width` elements in `window`.
///
/// `frame` supplies the raw intensities for the midpoint tie-break. Returns
/// `None` when no run qualifies.
pub fn extract_track(
    mask: &Mask,
    frame: &Frame,
    window: Window,
    min_width: usize,
) -> Option<TrackSpan> {
    let (left, right) = find_run(mask, window, min_width)?;
    Some(TrackSpan {
        left,
        right,
        mid: midpoint(frame, left, right),
    })
}

fn find_run(mask: &Mask, window: Window, min_width: usize) -> Option<(usize, usize)> {
    let mut run_start = None;
    let mut run_len = 0usize;

    for i in window.indices() {
        if mask.is_dark(i) {
            run_start.get_or_insert(i);
            run_len += 1;
        } else {
            if run_len >= min_width {
                return run_start.map(|left| (left, i - 1));
            }
            run_start = None;
            run_len = 0;
        }
    }

    // the window ended inside a run
    if run_len >= min_width {
        return run_start.map(|left| (left, window.end));
    }
    None
}

fn midpoint(frame: &Frame, left: usize, right: usize) -> usize {
    if (right - left) % 2 == 0 {
        return (left + right) / 2;
    }
    let first = (left + right - 1) / 2;
    let second = first + 1;
    match (frame.get(first), frame.get(second)) {
        (Some(a), Some(b)) if a < b => first,
        _ => second,
    }
}
