//! The boundary to the physical line camera.
//!
//! The estimation engine never talks to hardware directly. Anything that can
//! fill a [`Frame`] with one sample per sensor element implements
//! [`LineCamera`]: a bit-banged linear CCD driver, a replay of recorded frames,
//! or the [`SimulatedCamera`](crate::sensor::simulated::SimulatedCamera) used
//! by the tests.
//!
//! # Capture timing
//!
//! A capture reads out the pixels first and then waits `exposure_ms` before
//! returning, so the samples read by one call were integrated during the delay
//! of the *previous* call. [`capture_flushed`] issues the exposing capture
//! followed by a zero-delay capture whose data is authoritative.

use log::warn;
use thiserror::Error;

use super::frame::{Frame, MAX_PIXELS, Sample};

/// Failures reported by a capture or by the frame checks that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The device produced more samples than a frame can hold.
    #[error("frame overflow: more than {capacity} samples")]
    Overflow { capacity: usize },
    /// The device produced a different number of samples than configured.
    #[error("frame length mismatch: expected {expected} samples, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    /// A sample exceeds the converter's native resolution.
    #[error("sample {value} at pixel {index} exceeds the sensor maximum of {max}")]
    SampleOutOfRange { index: usize, value: Sample, max: Sample },
    /// The device itself failed.
    #[error("camera device error: {0}")]
    Device(String),
}

/// A linear optical sensor array that can be sampled once per call.
pub trait LineCamera {
    /// Reads every sensor element into `frame`, then waits `exposure_ms`
    /// milliseconds of integration time before returning.
    ///
    /// Implementations must leave exactly one sample per sensor element in
    /// `frame` on success.
    fn capture(&mut self, exposure_ms: u32, frame: &mut Frame) -> Result<(), CaptureError>;
}

impl<C: LineCamera + ?Sized> LineCamera for &mut C {
    fn capture(&mut self, exposure_ms: u32, frame: &mut Frame) -> Result<(), CaptureError> {
        (**self).capture(exposure_ms, frame)
    }
}

/// Captures with `exposure_ms` of integration and returns the settled frame.
///
/// The first capture only starts the integration window; its data is
/// overwritten by the second, zero-delay capture.
pub fn capture_flushed<C: LineCamera + ?Sized>(
    camera: &mut C,
    exposure_ms: u32,
    frame: &mut Frame,
) -> Result<(), CaptureError> {
    camera.capture(exposure_ms, frame)?;
    camera.capture(0, frame)
}

/// Verifies that a captured frame honours the capture contract.
///
/// # Errors
///
/// Returns [`CaptureError::FrameLength`] if the frame does not hold exactly
/// `pixel_count` samples, or [`CaptureError::SampleOutOfRange`] for the first
/// sample above `sample_max`.
pub fn check_frame(frame: &Frame, pixel_count: usize, sample_max: Sample) -> Result<(), CaptureError> {
    if frame.len() != pixel_count || pixel_count > MAX_PIXELS {
        warn!("Capture returned {} samples, expected {}", frame.len(), pixel_count);
        return Err(CaptureError::FrameLength {
            expected: pixel_count,
            actual:   frame.len(),
        });
    }
    if let Some((index, &value)) =
        frame.as_slice().iter().enumerate().find(|(_, v)| **v > sample_max)
    {
        warn!("Sample {} at pixel {} exceeds {}", value, index, sample_max);
        return Err(CaptureError::SampleOutOfRange {
            index,
            value,
            max: sample_max,
        });
    }
    Ok(())
}
