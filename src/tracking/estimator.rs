//! The stateful line-position estimator.
//!
//! A [`LineTracker`] owns the configuration, the frame and mask buffers and
//! the small amount of state carried from one cycle to the next (the
//! [`Baseline`]). Each cycle captures a frame at a fixed exposure (by default
//! the one calibration selected) and produces a [`CycleReport`] with one of
//! four outcomes:
//!
//! | Status               | Position | Meaning                                             |
//! |----------------------|----------|-----------------------------------------------------|
//! | `Normal`             | yes      | Track found at an expected threshold                |
//! | `HighDynamicRange`   | yes      | Track found, but only at an unusually high threshold |
//! | `NoTrack`            | no       | No threshold below 1.0 exposed a track              |
//! | `Platform`           | no       | The sensor sits over a large solid dark area        |
//!
//! # Carried state
//!
//! The threshold a track was found at becomes the starting point of the next
//! cycle's search; losing the track resets it to zero. With
//! [`BaselinePolicy::Drift`] the reference average also follows each found
//! track, so slow lighting changes do not trip platform detection. Platform
//! cycles leave both values untouched.
//!
//! # Example
//!
//! ```
//! use linetrack::sensor::simulated::SimulatedCamera;
//! use linetrack::tracking::{config::TrackingConfig, estimator::{LineTracker, TrackingStatus}};
//!
//! let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
//! let mut tracker = LineTracker::new(TrackingConfig::dynamic()).unwrap();
//!
//! let calibration = tracker.calibrate(&mut camera).unwrap();
//! assert!(calibration.is_usable());
//!
//! let report = tracker.cycle(&mut camera).unwrap();
//! assert_eq!(report.status, TrackingStatus::Normal);
//! assert!(report.position.is_some());
//! ```

use std::fmt;

use heapless::Vec;
use log::{info, trace, warn};

use crate::{
    sensor::{
        camera::{CaptureError, LineCamera, capture_flushed, check_frame},
        frame::{Frame, Mask, Sample},
    },
    tracking::{
        calibrate::{Calibration, ExposureTrial, MIDPOINT, run_trial},
        config::{
            BaselinePolicy, ConfigError, CycleExposure, MAX_TRIALS, PlatformRule, ThresholdSearch,
            TrackingConfig,
        },
        diagnostics::CycleObserver,
    },
    vision::{
        binarize::binarize_at,
        extract::TrackSpan,
        stats::FrameStats,
        sweep::{Detection, Scan},
    },
};

/// Outcome class of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingStatus {
    Normal,
    HighDynamicRange,
    NoTrack,
    Platform,
}

impl TrackingStatus {
    /// Whether a cycle with this status carries a position.
    pub fn has_position(&self) -> bool { matches!(self, Self::Normal | Self::HighDynamicRange) }
}

/// State carried between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    /// Average intensity platform detection compares against.
    pub reference_average: Sample,
    /// Threshold the next cycle's search starts from.
    pub threshold:         f32,
}

/// Dark and light element counts of the active window in the final mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelCensus {
    pub dark:  usize,
    pub light: usize,
}

/// Everything one cycle learned about its frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub status:      TrackingStatus,
    /// Track midpoint on the `0..=output_resolution` scale.
    pub position:    Option<u16>,
    /// The accepted track in sensor index space.
    pub span:        Option<TrackSpan>,
    /// Threshold fraction at which the track appeared.
    pub threshold:   Option<f32>,
    pub stats:       FrameStats,
    /// Current average over the reference average.
    pub solid_ratio: f32,
    /// `None` when the cycle never binarized the frame.
    pub census:      Option<PixelCensus>,
    /// Number of thresholds tried.
    pub attempts:    usize,
}

/// Estimates the line's lateral position from successive frames.
pub struct LineTracker {
    config:      TrackingConfig,
    baseline:    Baseline,
    exposure_ms: u32,
    frame:       Frame,
    mask:        Mask,
    last_status: Option<TrackingStatus>,
    observer:    Option<Box<dyn CycleObserver>>,
}

impl fmt::Debug for LineTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineTracker")
            .field("config", &self.config)
            .field("baseline", &self.baseline)
            .field("exposure_ms", &self.exposure_ms)
            .field("last_status", &self.last_status)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl LineTracker {
    /// Creates an uncalibrated tracker.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `config`.
    pub fn new(config: TrackingConfig) -> Result<Self, ConfigError> {
        Self::with_baseline(config, Baseline::default())
    }

    /// Creates a tracker that resumes from a previously calibrated baseline.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in `config`.
    pub fn with_baseline(config: TrackingConfig, baseline: Baseline) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            exposure_ms: config.nominal_exposure_ms,
            config,
            baseline,
            frame: Frame::new(),
            mask: Mask::new(),
            last_status: None,
            observer: None,
        })
    }

    pub fn config(&self) -> &TrackingConfig { &self.config }

    pub fn baseline(&self) -> Baseline { self.baseline }

    pub fn set_baseline(&mut self, baseline: Baseline) { self.baseline = baseline; }

    /// Exposure the next cycle captures with.
    pub fn exposure_ms(&self) -> u32 { self.exposure_ms }

    pub fn set_exposure_ms(&mut self, exposure_ms: u32) { self.exposure_ms = exposure_ms; }

    /// The most recently captured frame.
    pub fn frame(&self) -> &Frame { &self.frame }

    /// The mask left by the most recent threshold scan.
    pub fn mask(&self) -> &Mask { &self.mask }

    /// Status of the most recent cycle, if one has run since calibration.
    pub fn last_status(&self) -> Option<TrackingStatus> { self.last_status }

    pub fn set_observer(&mut self, observer: impl CycleObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) { self.observer = None; }

    /// Sweeps the configured exposure times and seeds the baseline from the
    /// best one.
    ///
    /// A calibration that finds no track leaves the baseline unchanged. A
    /// blocked sensor still seeds it; the caller decides whether to go on.
    ///
    /// # Errors
    ///
    /// Fails on the first capture error or malformed frame.
    pub fn calibrate<C: LineCamera + ?Sized>(
        &mut self,
        camera: &mut C,
    ) -> Result<Calibration, CaptureError> {
        let sweep = self.config.exposure;
        info!(
            "Calibrating over {}..={} ms in {} ms steps",
            sweep.start_ms, sweep.end_ms, sweep.step_ms
        );

        let mut trials: Vec<ExposureTrial, MAX_TRIALS> = Vec::new();
        for exposure_ms in sweep.times() {
            let trial =
                run_trial(&self.config, camera, exposure_ms, &mut self.frame, &mut self.mask)?;
            if let Some(observer) = self.observer.as_mut() {
                observer.on_trial(&self.frame, &self.mask, &trial);
            }
            if trials.push(trial).is_err() {
                warn!("Calibration stopped after {} trials", MAX_TRIALS);
                break;
            }
        }

        let calibration =
            Calibration::from_trials(&trials, self.config.selection, self.config.blocked);
        match calibration.best {
            Some(best) => {
                self.baseline = Baseline {
                    reference_average: best.stats.average,
                    threshold:         best.threshold,
                };
                if self.config.cycle_exposure == CycleExposure::Calibrated {
                    self.exposure_ms = best.exposure_ms;
                }
                info!(
                    "Calibrated: exposure {} ms, threshold {:.2}, reference {}, contrast {:.3}",
                    best.exposure_ms, best.threshold, best.stats.average, best.contrast
                );
            }
            None => warn!("Calibration found no track at any exposure"),
        }
        if calibration.blocked {
            warn!("Line sensor appears to be blocked");
        }
        self.last_status = None;
        Ok(calibration)
    }

    /// Captures one frame at the cycle exposure and estimates the position.
    ///
    /// # Errors
    ///
    /// Fails if the capture fails or the frame is malformed. The baseline is
    /// not touched in that case.
    pub fn cycle<C: LineCamera + ?Sized>(
        &mut self,
        camera: &mut C,
    ) -> Result<CycleReport, CaptureError> {
        let exposure_ms = self.exposure_ms;
        if self.config.flush_capture {
            capture_flushed(camera, exposure_ms, &mut self.frame)?;
        } else {
            camera.capture(exposure_ms, &mut self.frame)?;
        }
        check_frame(&self.frame, self.config.pixel_count, self.config.sample_max)?;
        Ok(self.evaluate())
    }

    /// Runs one cycle on a frame that was captured elsewhere.
    ///
    /// # Errors
    ///
    /// Fails if the frame is malformed.
    pub fn process(&mut self, frame: &Frame) -> Result<CycleReport, CaptureError> {
        check_frame(frame, self.config.pixel_count, self.config.sample_max)?;
        self.frame.fill_from(frame.as_slice())?;
        Ok(self.evaluate())
    }

    fn evaluate(&mut self) -> CycleReport {
        let window = self.config.window;
        let stats = FrameStats::measure(&self.frame, window);
        let solid_ratio = solid_ratio(stats.average, self.baseline.reference_average);

        let mut report = CycleReport {
            status: TrackingStatus::NoTrack,
            position: None,
            span: None,
            threshold: None,
            stats,
            solid_ratio,
            census: None,
            attempts: 0,
        };

        if self.is_platform(&stats, solid_ratio) {
            report.status = TrackingStatus::Platform;
            report.census = self.census();
            return self.finish(report);
        }

        let (detection, attempts) = self.search(&stats);
        report.attempts = attempts;
        report.census = Some(self.census_of_mask());

        match detection {
            Some(detection) => {
                let adaptive = matches!(self.config.cycle_search, ThresholdSearch::Sweep { .. });
                let limit = self.config.dynamic_range.limit(self.baseline.threshold);
                report.status = if adaptive && detection.threshold > limit {
                    TrackingStatus::HighDynamicRange
                } else {
                    TrackingStatus::Normal
                };
                report.span = Some(detection.span);
                report.threshold = Some(detection.threshold);
                report.position = Some(
                    window.remap(detection.span.mid, self.config.output_resolution),
                );

                if adaptive {
                    self.baseline.threshold = detection.threshold;
                }
                if self.config.baseline == BaselinePolicy::Drift {
                    self.baseline.reference_average = stats.average;
                }
            }
            None => {
                if matches!(self.config.cycle_search, ThresholdSearch::Sweep { .. }) {
                    self.baseline.threshold = 0.0;
                }
            }
        }
        self.finish(report)
    }

    /// Applies the platform rule. A dark-fraction rule binarizes the frame at
    /// the cycle's first threshold and leaves that mask behind; a solid-ratio
    /// rule clears the mask.
    fn is_platform(&mut self, stats: &FrameStats, solid_ratio: f32) -> bool {
        match self.config.platform {
            PlatformRule::SolidRatio(ratio) => {
                self.mask.reset(self.frame.len());
                solid_ratio < ratio
            }
            PlatformRule::DarkFraction(fraction) => {
                let cutoff = self.first_cutoff(stats);
                binarize_at(&self.frame, cutoff, self.config.window, &mut self.mask);
                let total = self.config.window.len();
                let limit = (total as f32 * fraction) as usize;
                self.mask.dark_count(self.config.window.indices()) > limit
            }
        }
    }

    /// Intensity the cycle's search binarizes at first.
    fn first_cutoff(&self, stats: &FrameStats) -> f32 {
        match self.config.cycle_search {
            ThresholdSearch::Sweep { .. } => stats.cutoff(self.baseline.threshold),
            ThresholdSearch::Midpoint => stats.cutoff(MIDPOINT),
            ThresholdSearch::ReferenceCutoff => self.reference_cutoff(stats),
        }
    }

    /// The reference average, or the frame's midpoint before calibration.
    fn reference_cutoff(&self, stats: &FrameStats) -> f32 {
        match self.baseline.reference_average {
            0 => stats.cutoff(MIDPOINT),
            reference => reference as f32,
        }
    }

    fn search(&mut self, stats: &FrameStats) -> (Option<Detection>, usize) {
        let reference = self.reference_cutoff(stats);
        let start = self.baseline.threshold;
        let scan = Scan {
            frame: &self.frame,
            stats,
            window: self.config.window,
            min_width: self.config.min_track_width,
        };

        match self.config.cycle_search {
            ThresholdSearch::Sweep { step } => {
                let result = scan.sweep(start, step, &mut self.mask);
                (result.detection, result.attempts)
            }
            ThresholdSearch::Midpoint => {
                let detection = scan.at_fraction(MIDPOINT, &mut self.mask).map(|span| Detection {
                    threshold: MIDPOINT,
                    span,
                });
                (detection, 1)
            }
            ThresholdSearch::ReferenceCutoff => {
                let detection = scan.at_cutoff(reference, &mut self.mask).map(|span| Detection {
                    threshold: stats.fraction_of(reference),
                    span,
                });
                (detection, 1)
            }
        }
    }

    fn census(&self) -> Option<PixelCensus> {
        match self.config.platform {
            PlatformRule::SolidRatio(_) => None,
            PlatformRule::DarkFraction(_) => Some(self.census_of_mask()),
        }
    }

    fn census_of_mask(&self) -> PixelCensus {
        let window = self.config.window;
        let dark = self.mask.dark_count(window.indices());
        PixelCensus {
            dark,
            light: window.len() - dark,
        }
    }

    fn finish(&mut self, report: CycleReport) -> CycleReport {
        if self.last_status != Some(report.status) {
            info!("Tracking status: {:?}", report.status);
        }
        trace!(
            "{:?} position {:?} threshold {:?} avg {} ratio {:.2} attempts {}",
            report.status,
            report.position,
            report.threshold,
            report.stats.average,
            report.solid_ratio,
            report.attempts
        );
        self.last_status = Some(report.status);

        if let Some(observer) = self.observer.as_mut() {
            observer.on_cycle(&self.frame, &self.mask, &report);
        }
        report
    }
}

/// Current average over reference average. Without a reference there is
/// nothing to compare against and the ratio is 1.
fn solid_ratio(average: Sample, reference: Sample) -> f32 {
    if reference == 0 { 1.0 } else { average as f32 / reference as f32 }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::sensor::simulated::{ReplayCamera, SimulatedCamera, Stripe};

    const STRIPE: Stripe = Stripe {
        center:      64.0,
        width:       14.0,
        reflectance: 0.1,
    };

    fn frame_from(f: impl Fn(usize) -> Sample) -> Frame {
        let samples: std::vec::Vec<Sample> = (0..128).map(f).collect();
        Frame::from_samples(&samples).unwrap()
    }

    fn line_at(left: usize, right: usize, dark: Sample, light: Sample) -> Frame {
        frame_from(|i| if (left..=right).contains(&i) { dark } else { light })
    }

    fn tracker(baseline: Baseline) -> LineTracker {
        LineTracker::with_baseline(TrackingConfig::dynamic(), baseline).unwrap()
    }

    #[test]
    fn reference_scenario() {
        let mut tracker = tracker(Baseline {
            reference_average: 125,
            threshold:         0.0,
        });
        let report = tracker.process(&line_at(60, 75, 50, 200)).unwrap();

        assert_eq!(report.status, TrackingStatus::Normal);
        let span = report.span.unwrap();
        assert_eq!((span.left, span.right, span.mid), (60, 75, 68));
        assert_eq!(report.position, Some(61));
        // t = 0 finds nothing, t = 0.1 does
        assert_eq!(report.attempts, 2);
        assert!((report.threshold.unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(
            report.census,
            Some(PixelCensus {
                dark:  16,
                light: 96,
            })
        );
        assert!((tracker.baseline().threshold - 0.1).abs() < 1e-6);
        assert_eq!(tracker.baseline().reference_average, 125);
    }

    #[test]
    fn platform_skips_search_and_keeps_carries() {
        let baseline = Baseline {
            reference_average: 100,
            threshold:         0.3,
        };
        let mut tracker = tracker(baseline);
        // window average 10
        let report = tracker.process(&frame_from(|_| 10)).unwrap();

        assert_eq!(report.status, TrackingStatus::Platform);
        assert_eq!(report.position, None);
        assert_eq!(report.attempts, 0);
        assert!((report.solid_ratio - 0.1).abs() < 1e-6);
        assert_eq!(report.census, None);
        assert_eq!(tracker.baseline(), baseline);
    }

    #[test]
    fn no_track_resets_threshold() {
        let mut tracker = tracker(Baseline {
            reference_average: 2000,
            threshold:         0.4,
        });
        let report = tracker.process(&frame_from(|_| 2000)).unwrap();

        assert_eq!(report.status, TrackingStatus::NoTrack);
        assert_eq!(report.position, None);
        assert_eq!(report.span, None);
        // 0.4, 0.5, ... 0.9
        assert_eq!(report.attempts, 6);
        assert_eq!(tracker.baseline().threshold, 0.0);
        assert_eq!(tracker.baseline().reference_average, 2000);
    }

    /// A dim line on a floor speckled with single dark elements.
    fn speckled_floor() -> Frame {
        frame_from(|i| match i {
            61..=75 => 700,
            _ if i % 2 == 1 => 100,
            _ => 1000,
        })
    }

    #[test]
    fn high_threshold_is_flagged() {
        let frame = speckled_floor();
        let mut tracker = tracker(Baseline {
            reference_average: 550,
            threshold:         0.0,
        });
        let report = tracker.process(&frame).unwrap();

        // dark once 100 + 900 * t > 700, first at t = 0.7 > clamp(0, 0.3, 0.8)
        assert_eq!(report.status, TrackingStatus::HighDynamicRange);
        assert_eq!(report.attempts, 8);
        assert!((report.threshold.unwrap() - 0.7).abs() < 1e-5);
        assert_eq!(report.span.map(|s| (s.left, s.right)), Some((61, 75)));
        assert!(report.position.is_some());
        assert!((tracker.baseline().threshold - 0.7).abs() < 1e-5);
    }

    #[test]
    fn previous_threshold_raises_the_limit() {
        let frame = speckled_floor();
        let mut tracker = tracker(Baseline {
            reference_average: 550,
            threshold:         0.62,
        });
        // first attempt at 0.62 misses, 0.72 hits; limit is clamp(6.2, 0.3, 0.8)
        let report = tracker.process(&frame).unwrap();
        assert_eq!(report.status, TrackingStatus::Normal);
        assert_eq!(report.attempts, 2);
    }

    #[test]
    fn reference_drifts_with_found_tracks() {
        let mut tracker = tracker(Baseline {
            reference_average: 125,
            threshold:         0.0,
        });
        tracker.process(&line_at(60, 75, 60, 300)).unwrap();
        assert_eq!(tracker.baseline().reference_average, 180);

        let mut config = TrackingConfig::dynamic();
        config.baseline = BaselinePolicy::Fixed;
        let mut fixed = LineTracker::with_baseline(config, Baseline {
            reference_average: 125,
            threshold:         0.0,
        })
        .unwrap();
        fixed.process(&line_at(60, 75, 60, 300)).unwrap();
        assert_eq!(fixed.baseline().reference_average, 125);
    }

    #[test]
    fn uncalibrated_tracker_never_reports_platform() {
        let mut tracker = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        let report = tracker.process(&frame_from(|_| 5)).unwrap();
        assert_eq!(report.solid_ratio, 1.0);
        assert_eq!(report.status, TrackingStatus::NoTrack);
    }

    #[test]
    fn malformed_frames_leave_state_alone() {
        let baseline = Baseline {
            reference_average: 125,
            threshold:         0.2,
        };
        let mut tracker = tracker(baseline);
        let short = Frame::from_samples(&[100; 64]).unwrap();
        assert!(matches!(
            tracker.process(&short),
            Err(CaptureError::FrameLength { .. })
        ));
        let hot = frame_from(|i| if i == 3 { 5000 } else { 100 });
        assert!(matches!(
            tracker.process(&hot),
            Err(CaptureError::SampleOutOfRange { index: 3, .. })
        ));
        assert_eq!(tracker.baseline(), baseline);
        assert_eq!(tracker.last_status(), None);
    }

    #[test]
    fn fixed_window_profile() {
        let mut tracker = LineTracker::new(TrackingConfig::fixed_window()).unwrap();
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);

        let calibration = tracker.calibrate(&mut camera).unwrap();
        // (20 + 4e) / (20 + 32e) falls with exposure; the longest one wins
        let best = calibration.best.unwrap();
        assert_eq!(best.exposure_ms, 80);
        assert_eq!(best.threshold, MIDPOINT);
        // 20 + 0.1 * 40 * 80 = 340 and 20 + 0.8 * 40 * 80 = 2580
        assert_eq!(tracker.baseline().reference_average, 1460);
        assert_eq!(tracker.exposure_ms(), 80);
        assert_eq!(calibration.trials, 8);

        let report = tracker.cycle(&mut camera).unwrap();
        assert_eq!(report.status, TrackingStatus::Normal);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.span.map(|s| (s.left, s.right)), Some((57, 70)));
        assert!((report.threshold.unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn dark_fraction_platform() {
        let mut tracker = LineTracker::with_baseline(TrackingConfig::fixed_window(), Baseline {
            reference_average: 200,
            threshold:         0.5,
        })
        .unwrap();
        // 100 of 112 window elements below the reference
        let frame = frame_from(|i| if (20..=119).contains(&i) { 50 } else { 400 });
        let report = tracker.process(&frame).unwrap();
        assert_eq!(report.status, TrackingStatus::Platform);
        assert_eq!(
            report.census,
            Some(PixelCensus {
                dark:  100,
                light: 12,
            })
        );
        assert_eq!(tracker.baseline().reference_average, 200);
    }

    #[test]
    fn calibrate_then_follow_a_moving_line() {
        let mut tracker = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        let mut camera = SimulatedCamera::new(128)
            .with_track(40.0, 14.0, 0.1)
            .with_noise(4.0, 11);

        let calibration = tracker.calibrate(&mut camera).unwrap();
        assert!(calibration.is_usable());
        assert_eq!(calibration.trials, 9);
        // every exposure finds the line at 0.01; the shortest wins
        assert_eq!(tracker.exposure_ms(), 60);
        // 9 trials of two captures each
        assert_eq!(camera.captures(), 18);
        let calibrated = tracker.baseline();
        assert!(calibrated.reference_average > 0);

        let mut last = None;
        for center in [40.0, 60.0, 80.0, 100.0] {
            camera.move_track(center);
            let report = tracker.cycle(&mut camera).unwrap();
            assert!(report.status.has_position(), "{:?}", report);
            let position = report.position.unwrap();
            if let Some(previous) = last {
                assert!(position > previous);
            }
            last = Some(position);
        }
        assert_eq!(camera.captures(), 26);
    }

    #[test]
    fn losing_and_covering_the_line() {
        let mut tracker = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
        tracker.calibrate(&mut camera).unwrap();

        camera.set_stripe(None);
        assert_eq!(tracker.cycle(&mut camera).unwrap().status, TrackingStatus::NoTrack);
        assert_eq!(tracker.baseline().threshold, 0.0);

        // a dark floor everywhere
        camera.background = 0.05;
        assert_eq!(tracker.cycle(&mut camera).unwrap().status, TrackingStatus::Platform);

        camera.background = 0.8;
        camera.set_stripe(Some(STRIPE));
        assert_eq!(tracker.cycle(&mut camera).unwrap().status, TrackingStatus::Normal);
    }

    #[test]
    fn observer_sees_every_cycle_and_trial() {
        let seen: Rc<RefCell<std::vec::Vec<TrackingStatus>>> = Rc::default();
        let trials = Rc::new(RefCell::new(0usize));

        struct Recorder {
            seen:   Rc<RefCell<std::vec::Vec<TrackingStatus>>>,
            trials: Rc<RefCell<usize>>,
        }
        impl CycleObserver for Recorder {
            fn on_cycle(&mut self, _: &Frame, mask: &Mask, report: &CycleReport) {
                assert_eq!(mask.len(), 128);
                self.seen.borrow_mut().push(report.status);
            }

            fn on_trial(&mut self, _: &Frame, _: &Mask, _: &ExposureTrial) {
                *self.trials.borrow_mut() += 1;
            }
        }

        let mut tracker = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        tracker.set_observer(Recorder {
            seen:   seen.clone(),
            trials: trials.clone(),
        });
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
        tracker.calibrate(&mut camera).unwrap();
        tracker.cycle(&mut camera).unwrap();
        camera.set_stripe(None);
        tracker.cycle(&mut camera).unwrap();

        assert_eq!(*trials.borrow(), 9);
        assert_eq!(*seen.borrow(), vec![TrackingStatus::Normal, TrackingStatus::NoTrack]);

        let positions = Rc::new(RefCell::new(std::vec::Vec::new()));
        let sink = positions.clone();
        tracker.set_observer(move |_: &Frame, _: &Mask, report: &CycleReport| {
            sink.borrow_mut().push(report.position);
        });
        camera.set_stripe(Some(STRIPE));
        tracker.cycle(&mut camera).unwrap();
        assert_eq!(positions.borrow().len(), 1);
        assert!(positions.borrow()[0].is_some());

        tracker.clear_observer();
        tracker.cycle(&mut camera).unwrap();
        assert_eq!(positions.borrow().len(), 1);
    }

    #[test]
    fn failed_calibration_is_reported_not_raised() {
        let config = TrackingConfig::dynamic();
        let nominal = config.nominal_exposure_ms;
        let mut tracker = LineTracker::new(config).unwrap();
        let mut camera = SimulatedCamera::new(128);

        let calibration = tracker.calibrate(&mut camera).unwrap();
        assert!(calibration.blocked);
        assert_eq!(calibration.best, None);
        assert_eq!((calibration.trials, calibration.valid_trials), (9, 0));
        assert_eq!(tracker.baseline(), Baseline::default());
        assert_eq!(tracker.exposure_ms(), nominal);

        // the caller may carry on; cycles still run
        let report = tracker.cycle(&mut camera).unwrap();
        assert_eq!(report.status, TrackingStatus::NoTrack);
        assert_eq!(report.position, None);
    }

    #[test]
    fn resumes_from_a_stored_operating_point() {
        let mut camera = SimulatedCamera::new(128).with_track(64.0, 14.0, 0.1);
        let mut calibrated = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        calibrated.calibrate(&mut camera).unwrap();
        let baseline = calibrated.baseline();
        let exposure_ms = calibrated.exposure_ms();
        let expected = calibrated.cycle(&mut camera).unwrap();

        let mut resumed = LineTracker::new(TrackingConfig::dynamic()).unwrap();
        resumed.set_baseline(baseline);
        resumed.set_exposure_ms(exposure_ms);
        assert_eq!(resumed.exposure_ms(), 60);
        assert!(format!("{:?}", resumed).contains("exposure_ms: 60"));

        let report = resumed.cycle(&mut camera).unwrap();
        assert_eq!(report.status, TrackingStatus::Normal);
        assert_eq!(report.position, expected.position);
        assert_eq!(report.attempts, 1);
    }

    #[test]
    fn replayed_frames_without_flush() {
        let mut config = TrackingConfig::dynamic();
        config.flush_capture = false;
        let mut tracker = LineTracker::with_baseline(config, Baseline {
            reference_average: 125,
            threshold:         0.0,
        })
        .unwrap();

        let mut camera = ReplayCamera::new(vec![
            line_at(60, 75, 50, 200),
            line_at(90, 105, 50, 200),
        ]);
        let first = tracker.cycle(&mut camera).unwrap();
        let second = tracker.cycle(&mut camera).unwrap();
        assert_eq!(first.position, Some(61));
        assert!(second.position > first.position);
        assert_eq!(camera.exposures(), &[10, 10]);
        assert!(tracker.cycle(&mut camera).is_err());
    }

    #[test]
    fn nominal_exposure_ignores_calibration() {
        let mut config = TrackingConfig::dynamic();
        config.cycle_exposure = CycleExposure::Nominal;
        let mut tracker = LineTracker::new(config).unwrap();
        let mut camera = ReplayCamera::new(vec![line_at(60, 75, 50, 200)]).looping();

        tracker.calibrate(&mut camera).unwrap();
        assert_eq!(tracker.exposure_ms(), 10);
        tracker.cycle(&mut camera).unwrap();
        assert_eq!(&camera.exposures()[18..], &[10, 0]);
    }

    #[test]
    fn platform_rule_can_be_disabled() {
        let mut config = TrackingConfig::dynamic();
        config.platform = PlatformRule::SolidRatio(0.0);
        let mut tracker = LineTracker::with_baseline(config, Baseline {
            reference_average: 100,
            threshold:         0.0,
        })
        .unwrap();
        let report = tracker.process(&frame_from(|_| 10)).unwrap();
        assert_eq!(report.status, TrackingStatus::NoTrack);
    }
}
