//! Per-cycle observation and text dumps of frames and masks.
//!
//! A [`CycleObserver`] installed on a
//! [`LineTracker`](crate::tracking::estimator::LineTracker) sees every frame,
//! mask and report the tracker produces, without changing what the tracker
//! computes. Any `FnMut(&Frame, &Mask, &CycleReport)` closure is an observer.
//!
//! The render functions turn one frame into a single line of text that fits
//! a serial terminal:
//!
//! - [`render_frame`]: one digit per element, `0` darkest to `9` brightest.
//! - [`render_mask`]: `x` for dark, `-` for light.
//! - [`render_marker`]: `^` under the track midpoint.
//!
//! ```text
//! 99999999999999999999999999999999000000000000000999999999999999999999999
//! --------------------------------xxxxxxxxxxxxxxx------------------------
//!                                        ^
//! ```

use heapless::String;
use log::debug;

use crate::{
    sensor::frame::{Frame, MAX_PIXELS, Mask, Sample},
    tracking::{calibrate::ExposureTrial, estimator::CycleReport},
};

/// One rendered line.
pub type DumpLine = String<MAX_PIXELS>;

/// Receives the tracker's intermediate data.
pub trait CycleObserver {
    /// Called after every steady-state cycle with the frame, the final mask
    /// and the report.
    fn on_cycle(&mut self, frame: &Frame, mask: &Mask, report: &CycleReport);

    /// Called after every calibration exposure trial.
    fn on_trial(&mut self, _frame: &Frame, _mask: &Mask, _trial: &ExposureTrial) {}
}

impl<F> CycleObserver for F
where
    F: FnMut(&Frame, &Mask, &CycleReport),
{
    fn on_cycle(&mut self, frame: &Frame, mask: &Mask, report: &CycleReport) {
        self(frame, mask, report)
    }
}

/// Quantizes each sample to a digit relative to `max`.
///
/// The digit is `floor(sample / max * 10 - 0.1)`, limited to `0..=9`. A zero
/// `max` renders every element as `0`.
pub fn render_frame(frame: &Frame, max: Sample) -> DumpLine {
    let mut line = DumpLine::new();
    for &sample in frame.as_slice() {
        let _ = line.push(quantize(sample, max));
    }
    line
}

fn quantize(sample: Sample, max: Sample) -> char {
    if max == 0 {
        return '0';
    }
    let level = (sample as f32 / max as f32 * 10.0 - 0.1).floor().clamp(0.0, 9.0);
    char::from(b'0' + level as u8)
}

pub fn render_mask(mask: &Mask) -> DumpLine {
    let mut line = DumpLine::new();
    for &dark in mask.as_slice() {
        let _ = line.push(if dark { 'x' } else { '-' });
    }
    line
}

/// A line of `len` blanks with `^` at `mid`, or all blanks without one.
pub fn render_marker(len: usize, mid: Option<usize>) -> DumpLine {
    let mut line = DumpLine::new();
    for i in 0..len.min(MAX_PIXELS) {
        let _ = line.push(if Some(i) == mid { '^' } else { ' ' });
    }
    line
}

/// Writes every cycle and trial to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDump;

impl CycleObserver for LogDump {
    fn on_cycle(&mut self, frame: &Frame, mask: &Mask, report: &CycleReport) {
        debug!(
            "{:?} position {:?} threshold {:?} min {} max {} avg {} ratio {:.2}",
            report.status,
            report.position,
            report.threshold,
            report.stats.min,
            report.stats.max,
            report.stats.average,
            report.solid_ratio
        );
        debug!("{}", render_frame(frame, report.stats.max));
        debug!("{}", render_mask(mask));
        debug!("{}", render_marker(frame.len(), report.span.map(|s| s.mid)));
    }

    fn on_trial(&mut self, frame: &Frame, mask: &Mask, trial: &ExposureTrial) {
        debug!("trial {} ms", trial.exposure_ms);
        debug!("{}", render_frame(frame, trial.stats.max));
        debug!("{}", render_mask(mask));
        debug!(
            "{}",
            render_marker(frame.len(), trial.detection.map(|d| d.span.mid))
        );
    }
}
