//! Exposure and threshold calibration.
//!
//! Calibration runs once at power-on. For every exposure time in the
//! configured sweep it captures a settled frame, measures it and searches for
//! the threshold at which a track first appears. The trial that exposes the
//! track most cleanly becomes the operating point: its average intensity is
//! the reference brightness for platform detection and its threshold is where
//! the first steady-state cycle starts searching.
//!
//! # Blocked sensor
//!
//! The sensor is reported blocked when no trial finds a track at all, or when
//! the lowest contrast seen is suspiciously low *and* the contrasts spread
//! widely across exposures, which a single bad exposure cannot produce on its
//! own.

use log::debug;

use crate::{
    sensor::{
        camera::{CaptureError, LineCamera, capture_flushed, check_frame},
        frame::{Frame, Mask},
    },
    tracking::config::{BlockedBounds, ThresholdSearch, TrackingConfig, TrialSelection},
    vision::{
        stats::FrameStats,
        sweep::{Detection, Scan},
    },
};

/// Threshold fraction used when calibration does not sweep.
pub const MIDPOINT: f32 = 0.5;

/// The measurements taken at one exposure time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureTrial {
    pub exposure_ms: u32,
    pub stats:       FrameStats,
    /// `min / max` of the active window, 0 for a fully dark frame.
    pub contrast:    f32,
    /// The first threshold that exposed a track, if any did.
    pub detection:   Option<Detection>,
}

impl ExposureTrial {
    pub fn threshold(&self) -> Option<f32> { self.detection.map(|d| d.threshold) }

    pub fn is_valid(&self) -> bool { self.detection.is_some() }
}

/// The exposure and threshold chosen by calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub exposure_ms: u32,
    pub stats:       FrameStats,
    pub threshold:   f32,
    pub contrast:    f32,
}

/// Result of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// The selected operating point. `None` if no exposure revealed a track.
    pub best:         Option<OperatingPoint>,
    /// Whether the sensor looks covered. The caller decides what to do about it.
    pub blocked:      bool,
    /// Number of exposure times tried.
    pub trials:       usize,
    /// Number of exposure times at which a track was found.
    pub valid_trials: usize,
}

impl Calibration {
    /// Selects the operating point from `trials` and runs the blocked test.
    pub fn from_trials(
        trials: &[ExposureTrial],
        selection: TrialSelection,
        bounds: BlockedBounds,
    ) -> Self {
        let best = select_best(trials, selection).and_then(|trial| {
            trial.threshold().map(|threshold| OperatingPoint {
                exposure_ms: trial.exposure_ms,
                stats: trial.stats,
                threshold,
                contrast: trial.contrast,
            })
        });
        Self {
            best,
            blocked: is_blocked(trials, bounds),
            trials: trials.len(),
            valid_trials: trials.iter().filter(|t| t.is_valid()).count(),
        }
    }

    /// An operating point was found and the sensor is not blocked.
    pub fn is_usable(&self) -> bool { self.best.is_some() && !self.blocked }
}

/// Picks the valid trial with the lowest threshold or contrast.
///
/// Ties keep the earliest trial, which is the shortest exposure.
pub fn select_best(trials: &[ExposureTrial], selection: TrialSelection) -> Option<&ExposureTrial> {
    let key = |trial: &ExposureTrial| match selection {
        TrialSelection::LowestThreshold => trial.threshold(),
        TrialSelection::LowestContrast => trial.threshold().map(|_| trial.contrast),
    };

    let mut best: Option<(&ExposureTrial, f32)> = None;
    for trial in trials {
        let Some(value) = key(trial) else { continue };
        match best {
            Some((_, current)) if value >= current => {}
            _ => best = Some((trial, value)),
        }
    }
    best.map(|(trial, _)| trial)
}

/// Smallest and largest contrast among valid trials.
pub fn contrast_range(trials: &[ExposureTrial]) -> Option<(f32, f32)> {
    trials
        .iter()
        .filter(|t| t.is_valid())
        .map(|t| t.contrast)
        .fold(None, |range, c| match range {
            None => Some((c, c)),
            Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
        })
}

/// Whether calibration should report the sensor as covered.
pub fn is_blocked(trials: &[ExposureTrial], bounds: BlockedBounds) -> bool {
    match contrast_range(trials) {
        None => true,
        Some((lo, hi)) => lo < bounds.low_contrast && hi - lo > bounds.spread,
    }
}

/// Captures and evaluates one exposure time.
///
/// The frame and mask are left holding the trial's data for observers.
pub(crate) fn run_trial<C: LineCamera + ?Sized>(
    config: &TrackingConfig,
    camera: &mut C,
    exposure_ms: u32,
    frame: &mut Frame,
    mask: &mut Mask,
) -> Result<ExposureTrial, CaptureError> {
    capture_flushed(camera, exposure_ms, frame)?;
    check_frame(frame, config.pixel_count, config.sample_max)?;

    let stats = FrameStats::measure(frame, config.window);
    let scan = Scan {
        frame,
        stats: &stats,
        window: config.window,
        min_width: config.min_track_width,
    };
    let detection = match config.calibration_search {
        ThresholdSearch::Sweep { step } => scan.sweep(0.0, step, mask).detection,
        ThresholdSearch::Midpoint | ThresholdSearch::ReferenceCutoff => scan
            .at_fraction(MIDPOINT, mask)
            .map(|span| Detection {
                threshold: MIDPOINT,
                span,
            }),
    };

    let trial = ExposureTrial {
        exposure_ms,
        stats,
        contrast: stats.contrast(),
        detection,
    };
    match trial.threshold() {
        Some(t) => debug!(
            "exposure {} ms: min {} max {} avg {} contrast {:.3} threshold {:.2}",
            exposure_ms, stats.min, stats.max, stats.average, trial.contrast, t
        ),
        None => debug!(
            "exposure {} ms: min {} max {} avg {} contrast {:.3}, no threshold found",
            exposure_ms, stats.min, stats.max, stats.average, trial.contrast
        ),
    }
    Ok(trial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sensor::simulated::SimulatedCamera, vision::extract::TrackSpan};

    const SPAN: TrackSpan = TrackSpan {
        left:  60,
        right: 75,
        mid:   68,
    };

    fn trial(exposure_ms: u32, contrast: f32, threshold: Option<f32>) -> ExposureTrial {
        ExposureTrial {
            exposure_ms,
            stats: FrameStats::from_range(100, 1000),
            contrast,
            detection: threshold.map(|threshold| Detection {
                threshold,
                span: SPAN,
            }),
        }
    }

    #[test]
    fn lowest_threshold_wins_and_ties_keep_first() {
        let trials = [
            trial(60, 0.3, Some(0.25)),
            trial(70, 0.2, None),
            trial(80, 0.4, Some(0.12)),
            trial(90, 0.1, Some(0.12)),
        ];
        let best = select_best(&trials, TrialSelection::LowestThreshold).unwrap();
        assert_eq!(best.exposure_ms, 80);

        let best = select_best(&trials, TrialSelection::LowestContrast).unwrap();
        assert_eq!(best.exposure_ms, 90);
    }

    #[test]
    fn invalid_trials_are_never_selected() {
        let trials = [trial(60, 0.01, None), trial(70, 0.5, Some(0.4))];
        assert_eq!(select_best(&trials, TrialSelection::LowestContrast).unwrap().exposure_ms, 70);
        assert_eq!(select_best(&trials[..1], TrialSelection::LowestThreshold), None);
    }

    #[test]
    fn blocked_when_nothing_found() {
        let bounds = BlockedBounds {
            low_contrast: 0.02,
            spread:       0.6,
        };
        let trials = [trial(60, 0.5, None), trial(70, 0.5, None)];
        assert!(is_blocked(&trials, bounds));
        assert!(is_blocked(&[], bounds));

        let calibration = Calibration::from_trials(&trials, TrialSelection::LowestThreshold, bounds);
        assert_eq!(calibration.best, None);
        assert!(calibration.blocked);
        assert!(!calibration.is_usable());
        assert_eq!((calibration.trials, calibration.valid_trials), (2, 0));
    }

    #[test]
    fn blocked_when_low_contrast_spreads_widely() {
        let bounds = BlockedBounds {
            low_contrast: 0.1,
            spread:       0.6,
        };
        let trials = [
            trial(60, 0.9, Some(0.3)),
            trial(70, 0.05, Some(0.2)),
            trial(80, 0.05, Some(0.2)),
        ];
        assert_eq!(contrast_range(&trials), Some((0.05, 0.9)));
        assert!(is_blocked(&trials, bounds));
    }

    #[test]
    fn not_blocked_with_steady_contrast() {
        let bounds = BlockedBounds {
            low_contrast: 0.1,
            spread:       0.6,
        };
        // low but uniform contrast
        let steady = [trial(60, 0.05, Some(0.2)), trial(70, 0.06, Some(0.2))];
        assert!(!is_blocked(&steady, bounds));

        // wide spread but nothing low
        let bright = [trial(60, 0.15, Some(0.2)), trial(70, 0.9, Some(0.2))];
        assert!(!is_blocked(&bright, bounds));
    }

    #[test]
    fn operating_point_from_selected_trial() {
        let trials = [trial(60, 0.3, Some(0.25)), trial(70, 0.2, Some(0.05))];
        let calibration = Calibration::from_trials(
            &trials,
            TrialSelection::LowestThreshold,
            TrackingConfig::dynamic().blocked,
        );
        let best = calibration.best.unwrap();
        assert_eq!(best.exposure_ms, 70);
        assert_eq!(best.stats.average, 550);
        assert!((best.threshold - 0.05).abs() < 1e-6);
        assert!(calibration.is_usable());
    }

    #[test]
    fn trial_sweeps_a_simulated_frame() {
        let config = TrackingConfig::dynamic();
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
        let mut frame = Frame::new();
        let mut mask = Mask::new();

        let trial = run_trial(&config, &mut camera, 60, &mut frame, &mut mask).unwrap();
        assert_eq!(camera.captures(), 2);
        // 20 + 0.1 * 40 * 60 and 20 + 0.8 * 40 * 60
        assert_eq!((trial.stats.min, trial.stats.max), (260, 1940));
        assert!((trial.threshold().unwrap() - 0.01).abs() < 1e-6);
        let span = trial.detection.unwrap().span;
        assert_eq!((span.left, span.right), (57, 70));
        assert!((trial.contrast - 260.0 / 1940.0).abs() < 1e-6);
    }

    #[test]
    fn trial_without_sweep_uses_midpoint() {
        let config = TrackingConfig::fixed_window();
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
        let mut frame = Frame::new();
        let mut mask = Mask::new();

        let trial = run_trial(&config, &mut camera, 30, &mut frame, &mut mask).unwrap();
        assert_eq!(trial.threshold(), Some(MIDPOINT));
    }

    #[test]
    fn trial_rejects_short_frames() {
        let config = TrackingConfig::dynamic();
        let mut camera = SimulatedCamera::new(100);
        let mut frame = Frame::new();
        let mut mask = Mask::new();
        assert_eq!(
            run_trial(&config, &mut camera, 60, &mut frame, &mut mask),
            Err(CaptureError::FrameLength {
                expected: 128,
                actual:   100,
            })
        );
    }
}
