//! The time-lapse capture loop.
//!
//! ```text
//! WaitingToStart ──► Capturing ──► Complete
//!        │               │
//!        └──► Aborted ◄──┘
//! ```
//!
//! `WaitingToStart` is only entered when a start time is configured. The
//! loop sleeps a fixed interval *after* each capture and does not subtract
//! the time the capture itself took, so a long session drifts late by the
//! sum of all capture latencies.

use super::{Camera, CameraError, CameraGuard, CaptureConfig, CapturedFrame, OutputConfig};
use super::{OutputDir, OutputError};
use crate::metrics::MetricsRegistry;
use crate::schedule::Schedule;
use crate::start::StartGate;
use crate::timing::{sleep_cancellable, CancelToken, Clock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    WaitingToStart,
    Capturing,
    Complete,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Aborted)
    }

    /// Numeric code exported as a metric.
    pub fn code(&self) -> i64 {
        match self {
            SessionState::Idle => 0,
            SessionState::WaitingToStart => 1,
            SessionState::Capturing => 2,
            SessionState::Complete => 3,
            SessionState::Aborted => 4,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::WaitingToStart => "waiting to start",
            SessionState::Capturing => "capturing",
            SessionState::Complete => "complete",
            SessionState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Fatal session errors. The camera has been released by the time one of
/// these is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Elapsed capture time against the total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total.is_zero() {
            return 100.0;
        }
        self.elapsed.as_secs_f64() / self.total.as_secs_f64() * 100.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} seconds, {:.2}%",
            self.elapsed.as_secs(),
            self.total.as_secs(),
            self.percent()
        )
    }
}

/// Outcome of [`TimelapseSession::run`].
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Terminal state, `Complete` or `Aborted`.
    pub state: SessionState,
    /// Every state the session passed through, in order.
    pub history: Vec<SessionState>,
    pub frames_captured: u64,
    /// Capture time, measured from the end of the warm-up.
    pub elapsed: Duration,
    pub schedule: Schedule,
    pub last_frame: Option<CapturedFrame>,
}

impl SessionReport {
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// True if the session ever reached `state`.
    pub fn visited(&self, state: SessionState) -> bool {
        self.history.contains(&state)
    }
}

/// One time-lapse recording.
pub struct TimelapseSession {
    schedule: Schedule,
    capture: CaptureConfig,
    output: OutputConfig,
    gate: StartGate,
    state: SessionState,
    history: Vec<SessionState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl TimelapseSession {
    pub fn new(schedule: Schedule, capture: CaptureConfig, output: OutputConfig) -> Self {
        Self {
            schedule,
            capture,
            output,
            gate: StartGate::immediate(),
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
            metrics: None,
        }
    }

    /// Delays capture until the gate opens.
    pub fn with_start_gate(mut self, gate: StartGate) -> Self {
        self.gate = gate;
        self
    }

    /// Publishes progress into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        metrics.set_schedule(&self.schedule);
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state change");
        self.state = next;
        self.history.push(next);
        if let Some(metrics) = &self.metrics {
            metrics.set_state(next);
        }
    }

    fn report(
        &mut self,
        state: SessionState,
        frames_captured: u64,
        elapsed: Duration,
        last_frame: Option<CapturedFrame>,
    ) -> SessionReport {
        self.transition(state);
        SessionReport {
            state,
            history: self.history.clone(),
            frames_captured,
            elapsed,
            schedule: self.schedule,
            last_frame,
        }
    }

    /// Runs the session to completion or cancellation.
    ///
    /// The output directory is prepared before any waiting so filesystem
    /// problems surface immediately. The camera is opened on entering
    /// `Capturing` and released on every exit path. Cancellation is not an
    /// error: it yields a report in the `Aborted` state.
    pub fn run<C, K>(
        &mut self,
        camera: &mut C,
        clock: &K,
        cancel: &CancelToken,
    ) -> Result<SessionReport, SessionError>
    where
        C: Camera + ?Sized,
        K: Clock + ?Sized,
    {
        let output = OutputDir::ensure(&self.output)?;

        if self.gate.is_delayed() {
            self.transition(SessionState::WaitingToStart);
        }
        if self.gate.wait(clock, cancel).is_err() {
            info!("Exit via user input");
            return Ok(self.report(SessionState::Aborted, 0, Duration::ZERO, None));
        }

        info!(
            "Time-lapse begin! Take a picture every {} seconds, for {} hours. That's {} pictures!",
            self.schedule.interval(),
            self.schedule.capture_hours(),
            self.schedule.total_pics()
        );
        if self.schedule.frame_shortfall() != 0 {
            debug!(
                movie_frames = self.schedule.movie_frames(),
                total_pics = self.schedule.total_pics(),
                "picture count rounds below the movie frame count"
            );
        }
        self.transition(SessionState::Capturing);

        let mut camera = CameraGuard::open(camera, &self.capture)?;
        camera.start_preview()?;
        if sleep_cancellable(clock, cancel, self.capture.warmup()).is_err() {
            info!("Capture exited early...");
            drop(camera);
            return Ok(self.report(SessionState::Aborted, 0, Duration::ZERO, None));
        }

        let interval = self.schedule.interval_duration();
        let total = self.schedule.capture_duration();
        let started = clock.monotonic();
        let mut frames_captured = 0u64;
        let mut last_frame = None;

        info!("Capture begin:");
        let state = loop {
            if cancel.is_cancelled() {
                break SessionState::Aborted;
            }

            let path = output.frame_path(frames_captured);
            if let Err(e) = camera.capture_to(&path) {
                // A terminal ctrl+c can take the driver down with us.
                if cancel.is_cancelled() {
                    debug!("capture interrupted: {}", e);
                    break SessionState::Aborted;
                }
                return Err(e.into());
            }
            let frame = CapturedFrame::new(path, frames_captured, clock.monotonic() - started);
            info!("\tCaptured {}", frame.path().display());
            frames_captured += 1;
            last_frame = Some(frame);
            if let Some(metrics) = &self.metrics {
                metrics.record_frame();
            }

            if sleep_cancellable(clock, cancel, interval).is_err() {
                break SessionState::Aborted;
            }

            let progress = Progress {
                elapsed: clock.monotonic() - started,
                total,
            };
            if let Some(metrics) = &self.metrics {
                metrics.record_progress(&progress);
            }
            if progress.elapsed >= total {
                break SessionState::Complete;
            }
            info!("\t\t{}", progress);
        };
        drop(camera);

        let elapsed = clock.monotonic() - started;
        match state {
            SessionState::Complete => info!("Capture complete!"),
            _ => info!("Capture exited early..."),
        }
        Ok(self.report(state, frames_captured, elapsed, last_frame))
    }
}
