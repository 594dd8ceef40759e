//! Session lifecycle tests: degraded mode, recalibration, command surface

use gaze_tracker::config::Config;
use gaze_tracker::features::GazeFeatures;
use gaze_tracker::session::{CalibrationProgress, Command, SessionState, TrackerSession};
use tempfile::TempDir;

fn quick_config() -> Config {
    let mut config = Config::default();
    config.calibration.frames_per_point = 2;
    config
}

fn features_at(u: f64, v: f64) -> GazeFeatures {
    GazeFeatures::new((u, v), (u, v), (u, v))
}

fn calibrate(session: &mut TrackerSession, points: usize, width: f64, height: f64) {
    session.start_calibration(points).unwrap();
    while session.state() == SessionState::Calibrating {
        let target = session.current_target().unwrap().clone();
        let f = features_at(f64::from(target.x) / width, f64::from(target.y) / height);
        session.calibration_frame(&f).unwrap();
    }
}

#[test]
fn test_degraded_mode_before_first_calibration() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();

    // Uncalibrated but functional: the fallback scales eye ratios
    assert_eq!(session.state(), SessionState::Idle);
    let out = session.process_frame(Some(&features_at(0.25, 0.75)));
    assert!(out.is_some());
}

#[test]
fn test_calibration_upgrades_to_tracking() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();

    calibrate(&mut session, 9, 1920.0, 1080.0);
    assert_eq!(session.state(), SessionState::Tracking);

    // A calibrated prediction for a known gaze lands near the trained
    // linear mapping's target
    let out = session.process_frame(Some(&features_at(0.5, 0.5))).unwrap();
    assert!((out.0 - 960).abs() < 50, "x {} far from 960", out.0);
    assert!((out.1 - 540).abs() < 50, "y {} far from 540", out.1);
}

#[test]
fn test_frames_during_calibration_emit_no_cursor_updates() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();
    session.start_calibration(9).unwrap();

    assert!(session.process_frame(Some(&features_at(0.5, 0.5))).is_none());
}

#[test]
fn test_recalibrate_command_restarts_collection() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();
    calibrate(&mut session, 9, 1920.0, 1080.0);

    session.handle_command(Command::Recalibrate(15)).unwrap();
    assert_eq!(session.state(), SessionState::Calibrating);
    assert_eq!(session.current_target().unwrap().index, 0);

    // The previous model still backs tracking if collection is aborted
    session.abort_calibration();
    assert_eq!(session.state(), SessionState::Tracking);
}

#[test]
fn test_unsupported_point_count_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();

    assert!(session.handle_command(Command::Recalibrate(12)).is_err());
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_smoothing_toggle_affects_trajectory() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();
    calibrate(&mut session, 9, 1920.0, 1080.0);

    // Smoothed: a sudden gaze jump is followed only partially
    for _ in 0..20 {
        session.process_frame(Some(&features_at(0.3, 0.3)));
    }
    let smoothed = session.process_frame(Some(&features_at(0.8, 0.8))).unwrap();

    // Unsmoothed: the same jump lands immediately
    session.handle_command(Command::ToggleSmoothing).unwrap();
    for _ in 0..20 {
        session.process_frame(Some(&features_at(0.3, 0.3)));
    }
    let raw = session.process_frame(Some(&features_at(0.8, 0.8))).unwrap();

    assert!(raw.0 > smoothed.0, "raw {} should overshoot smoothed {}", raw.0, smoothed.0);
}

#[test]
fn test_reset_filters_after_large_jump() {
    let dir = TempDir::new().unwrap();
    let mut session = TrackerSession::new(quick_config(), 1920, 1080, dir.path()).unwrap();
    calibrate(&mut session, 9, 1920.0, 1080.0);

    for _ in 0..20 {
        session.process_frame(Some(&features_at(0.1, 0.1)));
    }
    session.handle_command(Command::ResetFilters).unwrap();

    // With history cleared the next frame is not dragged toward the old
    // position
    let out = session.process_frame(Some(&features_at(0.9, 0.9))).unwrap();
    let expected = session.process_frame(Some(&features_at(0.9, 0.9))).unwrap();
    assert!((out.0 - expected.0).abs() < 100);
}
