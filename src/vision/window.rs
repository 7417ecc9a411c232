//! The active sensing window.

use std::ops::RangeInclusive;

/// An inclusive range of sensor elements used for statistics and detection.
///
/// Elements at the ends of a linear array see vignetting and stray light, so
/// they are left out. The window is fixed configuration and never changes at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// First element inside the window.
    pub start: usize,
    /// Last element inside the window.
    pub end:   usize,
}

impl Window {
    pub const fn new(start: usize, end: usize) -> Self { Self { start, end } }

    /// Number of elements in the window.
    pub fn len(&self) -> usize {
        if self.end < self.start { 0 } else { self.end - self.start + 1 }
    }

    pub fn is_empty(&self) -> bool { self.end < self.start }

    pub fn indices(&self) -> RangeInclusive<usize> { self.start..=self.end }

    pub fn contains(&self, index: usize) -> bool { self.indices().contains(&index) }

    /// Linearly maps `index` from `[start, end]` onto `[0, resolution]`,
    /// rounding to the nearest output step.
    ///
    /// Indices outside the window are clamped to the output range.
    ///
    /// # Example
    ///
    /// ```
    /// use linetrack::vision::window::Window;
    ///
    /// let window = Window::new(15, 126);
    /// assert_eq!(window.remap(15, 128), 0);
    /// assert_eq!(window.remap(126, 128), 128);
    /// ```
    pub fn remap(&self, index: usize, resolution: u16) -> u16 {
        if self.end <= self.start {
            return 0;
        }
        let span = (self.end - self.start) as f32;
        let offset = index as f32 - self.start as f32;
        let mapped = (offset * resolution as f32 / span).round();
        mapped.clamp(0.0, resolution as f32) as u16
    }
}
