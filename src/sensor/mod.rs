//! Sensor frames and the capture boundary.
//!
//! This module holds everything that sits between the physical line camera
//! and the estimation algorithms:
//!
//! - **[`frame`]**: Fixed-capacity [`Frame`](frame::Frame) and
//!   [`Mask`](frame::Mask) buffers.
//! - **[`camera`]**: The [`LineCamera`](camera::LineCamera) trait every capture
//!   source implements, plus the flushed-capture helper and frame checks.
//! - **[`simulated`]**: Software cameras for tests, demos and offline replay.
//!
//! # Hardware
//!
//! A typical part is a 128-element linear CCD read through a 12-bit ADC. The
//! driver pulses SI, clocks out one pixel per CLK pulse and samples AO on each
//! one. That wire protocol lives in the board support code, which only has to
//! implement [`LineCamera`](camera::LineCamera).

/// Capture trait, capture errors and frame contract checks.
pub mod camera;

/// Frame and mask buffers.
pub mod frame;

/// Simulated and replayed cameras.
pub mod simulated;
