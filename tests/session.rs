//! End-to-end time-lapse sessions on a mock camera and virtual clock.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use pi_timelapse::capture::{
    CaptureConfig, MockCamera, OutputConfig, ScheduleConfig, SessionState, TimelapseSession,
    MOCK_FRAME,
};
use pi_timelapse::metrics::MetricsRegistry;
use pi_timelapse::schedule::{Schedule, ScheduleError};
use pi_timelapse::start::{StartGate, StartTimeArgs};
use pi_timelapse::timing::{CancelToken, Clock, MockClock};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn evening() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 22)
        .unwrap()
        .and_hms_opt(19, 58, 30)
        .unwrap()
}

/// 36 seconds of capture for a 6 frame movie: one still every 6 seconds.
fn short_session(dir: &Path) -> TimelapseSession {
    let schedule = Schedule::compute(0.01, 6, 1).unwrap();
    let output = OutputConfig {
        directory: dir.join("time-lapse"),
        ..Default::default()
    };
    TimelapseSession::new(schedule, CaptureConfig::default(), output)
}

fn frame_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.join("time-lapse"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn delayed_session_waits_then_captures() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = MockClock::new(evening());
    let mut camera = MockCamera::new();
    let metrics = Arc::new(MetricsRegistry::new().unwrap());

    // --hour 20 at 19:58:30 means 20:00:00, 90 seconds away.
    let target = StartTimeArgs {
        hour: Some(20),
        ..Default::default()
    }
    .resolve(clock.now())
    .unwrap();
    assert_eq!(target, Some(evening() + TimeDelta::seconds(90)));

    let report = short_session(tmp.path())
        .with_start_gate(StartGate::new(target))
        .with_metrics(Arc::clone(&metrics))
        .run(&mut camera, &clock, &CancelToken::new())
        .unwrap();

    assert_eq!(
        report.history,
        [
            SessionState::Idle,
            SessionState::WaitingToStart,
            SessionState::Capturing,
            SessionState::Complete,
        ]
    );
    assert_eq!(report.frames_captured, 6);
    // 90 s wait + 2 s warm-up + 36 s capture
    assert_eq!(clock.monotonic(), Duration::from_secs(128));
    assert_eq!(metrics.frames_captured(), 6);
    assert_eq!(camera.close_count(), 1);

    assert_eq!(
        frame_files(tmp.path()),
        [
            "timelapse0000.jpeg",
            "timelapse0001.jpeg",
            "timelapse0002.jpeg",
            "timelapse0003.jpeg",
            "timelapse0004.jpeg",
            "timelapse0005.jpeg",
        ]
    );
}

#[test]
fn past_start_time_does_not_block() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = MockClock::new(evening());
    let mut camera = MockCamera::new();

    let report = short_session(tmp.path())
        .with_start_gate(StartGate::new(Some(evening() - TimeDelta::hours(3))))
        .run(&mut camera, &clock, &CancelToken::new())
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(clock.monotonic(), Duration::from_secs(38));
}

#[test]
fn interrupt_while_waiting_aborts_before_capturing() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = MockClock::new(evening());
    let token = CancelToken::new();
    clock.cancel_at(Duration::from_secs(45), token.clone());
    let mut camera = MockCamera::new();

    let report = short_session(tmp.path())
        .with_start_gate(StartGate::new(Some(evening() + TimeDelta::hours(8))))
        .run(&mut camera, &clock, &token)
        .unwrap();

    assert_eq!(report.state, SessionState::Aborted);
    assert!(!report.visited(SessionState::Capturing));
    assert_eq!(report.frames_captured, 0);
    assert_eq!(camera.open_count(), 0);
    assert!(frame_files(tmp.path()).is_empty());
}

#[test]
fn interrupt_while_capturing_releases_camera_once() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = MockClock::new(evening());
    let token = CancelToken::new();
    let mut camera = MockCamera::new().cancel_after(3, token.clone());

    let report = short_session(tmp.path())
        .run(&mut camera, &clock, &token)
        .unwrap();

    assert_eq!(report.state, SessionState::Aborted);
    assert!(report.visited(SessionState::Capturing));
    assert_eq!(report.frames_captured, 3);
    assert_eq!(camera.open_count(), 1);
    assert_eq!(camera.close_count(), 1);
    assert!(!camera.is_previewing());
}

#[test]
fn interrupt_that_kills_a_capture_still_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = MockClock::new(evening());
    let token = CancelToken::new();
    let mut camera = MockCamera::new().interrupt_at(3, token.clone());

    let report = short_session(tmp.path())
        .run(&mut camera, &clock, &token)
        .unwrap();

    assert_eq!(report.state, SessionState::Aborted);
    assert!(report.visited(SessionState::Capturing));
    assert!(!report.visited(SessionState::Complete));
    assert_eq!(report.frames_captured, 2);
    assert_eq!(camera.open_count(), 1);
    assert_eq!(camera.close_count(), 1);
    assert!(!camera.is_previewing());
    assert_eq!(frame_files(tmp.path()).len(), 2);
}

#[test]
fn rerun_overwrites_previous_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("time-lapse");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("timelapse0000.jpeg"), b"stale").unwrap();

    let clock = MockClock::new(evening());
    let mut camera = MockCamera::new();
    short_session(tmp.path())
        .run(&mut camera, &clock, &CancelToken::new())
        .unwrap();

    assert_eq!(frame_files(tmp.path()).len(), 6);
    assert_eq!(
        std::fs::read(dir.join("timelapse0000.jpeg")).unwrap(),
        MOCK_FRAME
    );
}

#[test]
fn invalid_schedule_fails_before_camera_is_touched() {
    let config = ScheduleConfig {
        framerate: 0,
        ..Default::default()
    };
    let camera = MockCamera::new();

    assert_eq!(config.compute(), Err(ScheduleError::ZeroFramerate));
    assert_eq!(camera.open_count(), 0);
}

#[test]
fn one_hour_session_schedule() {
    let schedule = ScheduleConfig::default().compute().unwrap();

    assert_eq!(schedule.capture_secs(), 3600);
    assert_eq!(schedule.movie_frames(), 1800);
    assert_eq!(schedule.interval(), 2.0);
    assert_eq!(schedule.total_pics(), 1800);
}
