//! Fixed-capacity frame and mask buffers.
//!
//! A [`Frame`] holds one raw intensity sample per sensor element, exactly as
//! produced by a single capture. A [`Mask`] holds the dark/light verdict for
//! each element after binarization. Both are backed by [`heapless::Vec`] so a
//! tracker can own one of each and reuse them every cycle without touching
//! the heap.
//!
//! # Example
//!
//! ```
//! use linetrack::sensor::frame::Frame;
//!
//! let frame = Frame::from_samples(&[200, 200, 50, 50, 200]).unwrap();
//! assert_eq!(frame.len(), 5);
//! assert_eq!(frame[2], 50);
//! ```

use std::ops::Index;

use heapless::Vec;

use crate::sensor::camera::CaptureError;

/// The largest sensor element count a frame can hold.
pub const MAX_PIXELS: usize = 256;

/// A raw intensity sample as read from the analog-to-digital converter.
pub type Sample = u16;

/// One captured line of raw intensities, indexed `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    samples: Vec<Sample, MAX_PIXELS>,
}

impl Frame {
    /// Creates an empty frame.
    pub fn new() -> Self { Self { samples: Vec::new() } }

    /// Creates a frame holding a copy of `samples`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Overflow`] if more than [`MAX_PIXELS`] samples
    /// are given.
    pub fn from_samples(samples: &[Sample]) -> Result<Self, CaptureError> {
        let mut frame = Self::new();
        frame.fill_from(samples)?;
        Ok(frame)
    }

    /// Discards all samples so the buffer can be refilled by the next capture.
    pub fn clear(&mut self) { self.samples.clear(); }

    /// Appends one sample.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Overflow`] if the frame is already full.
    pub fn push(&mut self, sample: Sample) -> Result<(), CaptureError> {
        self.samples
            .push(sample)
            .map_err(|_| CaptureError::Overflow { capacity: MAX_PIXELS })
    }

    /// Replaces the frame contents with `samples`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Overflow`] if more than [`MAX_PIXELS`] samples
    /// are given. The frame is left empty in that case.
    pub fn fill_from(&mut self, samples: &[Sample]) -> Result<(), CaptureError> {
        self.samples.clear();
        self.samples.extend_from_slice(samples).map_err(|_| {
            self.samples.clear();
            CaptureError::Overflow { capacity: MAX_PIXELS }
        })
    }

    pub fn len(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    pub fn get(&self, index: usize) -> Option<Sample> { self.samples.get(index).copied() }

    pub fn as_slice(&self) -> &[Sample] { &self.samples }
}

impl Index<usize> for Frame {
    type Output = Sample;

    fn index(&self, index: usize) -> &Sample { &self.samples[index] }
}

/// Dark/light verdict per sensor element. `true` means dark.
///
/// Only the active window of a mask is meaningful; the binarizer clears every
/// element outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mask {
    dark: Vec<bool, MAX_PIXELS>,
}

impl Mask {
    pub fn new() -> Self { Self { dark: Vec::new() } }

    /// Resizes the mask to `len` elements, all light.
    ///
    /// `len` is clamped to [`MAX_PIXELS`]; frames can never be longer than that.
    pub fn reset(&mut self, len: usize) {
        self.dark.clear();
        let _ = self.dark.resize(len.min(MAX_PIXELS), false);
    }

    pub fn set(&mut self, index: usize, dark: bool) {
        if let Some(slot) = self.dark.get_mut(index) {
            *slot = dark;
        }
    }

    /// Whether the element at `index` is dark. Elements past the end read as light.
    pub fn is_dark(&self, index: usize) -> bool { self.dark.get(index).copied().unwrap_or(false) }

    pub fn len(&self) -> usize { self.dark.len() }

    pub fn is_empty(&self) -> bool { self.dark.is_empty() }

    pub fn as_slice(&self) -> &[bool] { &self.dark }

    /// Counts dark elements whose index falls in `range`.
    pub fn dark_count(&self, range: std::ops::RangeInclusive<usize>) -> usize {
        range.filter(|&i| self.is_dark(i)).count()
    }
}
