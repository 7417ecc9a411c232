//! Software line cameras for tests, demos and bring-up.
//!
//! - [`SimulatedCamera`] renders a scene (a light background with an optional
//!   dark track) and integrates it over the requested exposure, the same way a
//!   linear CCD accumulates charge between readouts.
//! - [`ReplayCamera`] plays back frames recorded from a real sensor.
//!
//! # Example
//!
//! ```
//! use linetrack::sensor::{camera::{LineCamera, capture_flushed}, frame::Frame};
//! use linetrack::sensor::simulated::SimulatedCamera;
//!
//! let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
//! let mut frame = Frame::new();
//! capture_flushed(&mut camera, 40, &mut frame).unwrap();
//! assert!(frame[64] < frame[20]);
//! ```

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{
    camera::{CaptureError, LineCamera},
    frame::{Frame, Sample},
};

/// A dark stripe on the floor under the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stripe {
    /// Center of the stripe in pixel coordinates.
    pub center:      f32,
    /// Width of the stripe in pixels.
    pub width:       f32,
    /// Fraction of light reflected by the stripe (0.0-1.0).
    pub reflectance: f32,
}

impl Stripe {
    fn covers(&self, pixel: usize) -> bool {
        let x = pixel as f32 + 0.5;
        (x - self.center).abs() < self.width / 2.0
    }
}

/// A scene-driven model of a linear CCD.
///
/// Samples read by a capture were integrated during the delay requested by
/// the previous capture:
///
/// `sample = dark_level + reflectance * gain * integration_ms (+ noise)`
///
/// saturated to `0..=sample_max`.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    /// Number of sensor elements.
    pub pixel_count:  usize,
    /// Largest value the converter can report.
    pub sample_max:   Sample,
    /// Reading of an element that received no light.
    pub dark_level:   f32,
    /// Counts accumulated per millisecond by a fully reflective surface.
    pub gain:         f32,
    /// Reflectance of the floor around the track.
    pub background:   f32,
    /// The track, if one is under the sensor.
    pub stripe:       Option<Stripe>,
    /// Relative illumination loss at the array ends (0.0 = flat field).
    pub edge_falloff: f32,
    noise:            f32,
    rng:              StdRng,
    pending_ms:       u32,
    captures:         usize,
}

impl SimulatedCamera {
    /// Creates a 12-bit camera over a plain light floor with no track.
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            sample_max: 4095,
            dark_level: 20.0,
            gain: 40.0,
            background: 0.8,
            stripe: None,
            edge_falloff: 0.0,
            noise: 0.0,
            rng: StdRng::seed_from_u64(0),
            pending_ms: 0,
            captures: 0,
        }
    }

    /// Places a dark track of `width` pixels centered on `center`.
    pub fn with_track(mut self, center: f32, width: f32, reflectance: f32) -> Self {
        self.stripe = Some(Stripe {
            center,
            width,
            reflectance,
        });
        self
    }

    /// Adds uniform sensor noise of up to `amplitude` counts, drawn from a
    /// generator seeded with `seed`.
    pub fn with_noise(mut self, amplitude: f32, seed: u64) -> Self {
        self.noise = amplitude.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_background(mut self, reflectance: f32) -> Self {
        self.background = reflectance;
        self
    }

    /// Moves the track, keeping its width and reflectance.
    pub fn move_track(&mut self, center: f32) {
        if let Some(stripe) = self.stripe.as_mut() {
            stripe.center = center;
        }
    }

    pub fn set_stripe(&mut self, stripe: Option<Stripe>) { self.stripe = stripe; }

    /// Number of capture calls served so far.
    pub fn captures(&self) -> usize { self.captures }

    fn reflectance_at(&self, pixel: usize) -> f32 {
        let base = match self.stripe {
            Some(stripe) if stripe.covers(pixel) => stripe.reflectance,
            _ => self.background,
        };
        if self.edge_falloff == 0.0 || self.pixel_count < 2 {
            return base;
        }
        let half = (self.pixel_count - 1) as f32 / 2.0;
        let offset = (pixel as f32 - half) / half;
        base * (1.0 - self.edge_falloff * offset * offset).max(0.0)
    }
}

impl LineCamera for SimulatedCamera {
    fn capture(&mut self, exposure_ms: u32, frame: &mut Frame) -> Result<(), CaptureError> {
        let integration_ms = self.pending_ms as f32;
        self.pending_ms = exposure_ms;
        self.captures += 1;

        frame.clear();
        for pixel in 0..self.pixel_count {
            let mut value = self.dark_level + self.reflectance_at(pixel) * self.gain * integration_ms;
            if self.noise > 0.0 {
                value += self.rng.gen_range(-self.noise..=self.noise);
            }
            let sample = value.round().clamp(0.0, self.sample_max as f32) as Sample;
            frame.push(sample)?;
        }
        Ok(())
    }
}

/// Plays back recorded frames in order, one per capture.
///
/// Requested exposures are recorded but have no effect on the data.
#[derive(Debug, Clone, Default)]
pub struct ReplayCamera {
    frames:    Vec<Frame>,
    next:      usize,
    looping:   bool,
    exposures: Vec<u32>,
}

impl ReplayCamera {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Restarts from the first frame once the recording runs out.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Exposure times requested by every capture so far.
    pub fn exposures(&self) -> &[u32] { &self.exposures }

    /// Frames left before the recording is exhausted.
    pub fn remaining(&self) -> usize { self.frames.len().saturating_sub(self.next) }
}

impl LineCamera for ReplayCamera {
    fn capture(&mut self, exposure_ms: u32, frame: &mut Frame) -> Result<(), CaptureError> {
        self.exposures.push(exposure_ms);
        if self.next >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(CaptureError::Device(format!(
                    "replay exhausted after {} frames",
                    self.frames.len()
                )));
            }
            self.next = 0;
        }
        frame.fill_from(self.frames[self.next].as_slice())?;
        self.next += 1;
        Ok(())
    }
}
