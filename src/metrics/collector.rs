//! Metrics collection and registry.

use crate::capture::{Progress, SessionState};
use crate::schedule::Schedule;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for a capture session.
///
/// All handles are internally shared, so the registry can be updated from
/// the capture thread while the exporter reads it from another.
pub struct MetricsRegistry {
    registry: Registry,

    // Schedule
    expected_frames: IntGauge,
    interval_seconds: Gauge,
    capture_seconds: IntGauge,

    // Progress
    frames_captured: IntCounter,
    elapsed_seconds: Gauge,
    progress_percent: Gauge,
    session_state: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all session metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let expected_frames = IntGauge::new(
            "timelapse_expected_frames",
            "Pictures the schedule expects to take",
        )?;
        let interval_seconds = Gauge::new(
            "timelapse_capture_interval_seconds",
            "Seconds slept between captures",
        )?;
        let capture_seconds = IntGauge::new(
            "timelapse_capture_duration_seconds",
            "Total capture time of the session",
        )?;

        let frames_captured = IntCounter::new(
            "timelapse_frames_captured_total",
            "Stills written so far",
        )?;
        let elapsed_seconds = Gauge::new(
            "timelapse_elapsed_seconds",
            "Capture time elapsed so far",
        )?;
        let progress_percent = Gauge::new(
            "timelapse_progress_percent",
            "Elapsed capture time as a percentage of the total",
        )?;
        let session_state = IntGauge::new(
            "timelapse_session_state",
            "Session state (0=idle, 1=waiting, 2=capturing, 3=complete, 4=aborted)",
        )?;

        registry.register(Box::new(expected_frames.clone()))?;
        registry.register(Box::new(interval_seconds.clone()))?;
        registry.register(Box::new(capture_seconds.clone()))?;
        registry.register(Box::new(frames_captured.clone()))?;
        registry.register(Box::new(elapsed_seconds.clone()))?;
        registry.register(Box::new(progress_percent.clone()))?;
        registry.register(Box::new(session_state.clone()))?;

        Ok(Self {
            registry,
            expected_frames,
            interval_seconds,
            capture_seconds,
            frames_captured,
            elapsed_seconds,
            progress_percent,
            session_state,
        })
    }

    pub fn set_schedule(&self, schedule: &Schedule) {
        self.expected_frames.set(schedule.total_pics() as i64);
        self.interval_seconds.set(schedule.interval());
        self.capture_seconds.set(schedule.capture_secs() as i64);
    }

    pub fn set_state(&self, state: SessionState) {
        self.session_state.set(state.code());
    }

    pub fn record_frame(&self) {
        self.frames_captured.inc();
    }

    pub fn record_progress(&self, progress: &Progress) {
        self.elapsed_seconds.set(progress.elapsed.as_secs_f64());
        self.progress_percent.set(progress.percent());
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured.get()
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
