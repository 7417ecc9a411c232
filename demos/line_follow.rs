use linetrack::{
    fs::logger,
    sensor::simulated::SimulatedCamera,
    tracking::{
        config::TrackingConfig,
        diagnostics::LogDump,
        estimator::{LineTracker, TrackingStatus},
    },
};
use log::{LevelFilter, error, info, warn};

/// Steering gain, in pixels of lateral correction per unit of position error.
const STEER_GAIN: f32 = 0.35;

fn main() {
    if logger::init(LevelFilter::Info).is_err() {
        eprintln!("Logger already installed");
    }

    let profile = std::env::args().nth(1);
    let config = match profile.as_deref() {
        Some("fixed") => TrackingConfig::fixed_window(),
        _ => TrackingConfig::dynamic(),
    };
    let resolution = config.output_resolution;

    let mut tracker = match LineTracker::new(config) {
        Ok(tracker) => tracker,
        Err(e) => {
            error!("Cannot start: {}", e);
            return;
        }
    };
    if std::env::var_os("LINETRACK_DUMP").is_some() {
        tracker.set_observer(LogDump);
    }

    let mut camera = SimulatedCamera::new(128)
        .with_track(64.0, 14.0, 0.1)
        .with_noise(6.0, 42);

    let calibration = match tracker.calibrate(&mut camera) {
        Ok(calibration) => calibration,
        Err(e) => {
            error!("Calibration failed: {}", e);
            return;
        }
    };
    if !calibration.is_usable() {
        warn!("Sensor unusable (blocked: {}), stopping", calibration.blocked);
        return;
    }

    // the line drifts sideways; the vehicle steers to keep it centered
    let mut line = 64.0f32;
    let center = resolution as f32 / 2.0;
    for tick in 0..60u32 {
        line += (tick as f32 * 0.2).sin() * 3.0;
        if (40..44).contains(&tick) {
            // crossing a start/finish platform
            camera.background = 0.05;
        } else {
            camera.background = 0.8;
        }
        camera.move_track(line);

        let report = match tracker.cycle(&mut camera) {
            Ok(report) => report,
            Err(e) => {
                warn!("Cycle {} skipped: {}", tick, e);
                continue;
            }
        };

        match (report.status, report.position) {
            (TrackingStatus::Normal | TrackingStatus::HighDynamicRange, Some(position)) => {
                let error = position as f32 - center;
                line -= error * STEER_GAIN;
                info!(
                    "tick {:2}: {:?} position {:3} steer {:+.1}",
                    tick,
                    report.status,
                    position,
                    -error * STEER_GAIN
                );
            }
            (status, _) => info!("tick {:2}: {:?}, holding course", tick, status),
        }
    }
}
