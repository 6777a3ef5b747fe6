//! Interval and picture-count calculation.
//!
//! # Picture count
//!
//! The capture time is truncated to whole seconds before anything else, and
//! the picture count is re-derived as `capture_secs / interval` instead of
//! reusing `movie_seconds * framerate`. Floating point division can leave that
//! quotient a hair under the intended frame count, in which case truncation
//! yields one picture fewer. Downstream tooling relies on this exact value, so
//! it is kept as is; [`Schedule::frame_shortfall`] exposes the difference.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rejected schedule inputs.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScheduleError {
    #[error("capture time must be a positive number of hours, got {0}")]
    InvalidCaptureTime(f64),
    #[error("capture time of {0} hours is shorter than one second")]
    CaptureTooShort(f64),
    #[error("movie duration must be at least one second")]
    ZeroMovieDuration,
    #[error("framerate must be at least one frame per second")]
    ZeroFramerate,
    #[error("capture interval of {0} seconds is too long")]
    IntervalTooLong(f64),
}

/// Derived capture schedule. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Schedule {
    capture_hours: f64,
    capture_secs: u64,
    movie_frames: u64,
    interval: f64,
    interval_duration: Duration,
    total_pics: u64,
}

impl Schedule {
    /// Computes the schedule for recording `capture_hours` worth of pictures
    /// that play back as a `movie_seconds` long movie at `framerate` fps.
    pub fn compute(
        capture_hours: f64,
        movie_seconds: u32,
        framerate: u32,
    ) -> Result<Self, ScheduleError> {
        if !capture_hours.is_finite() || capture_hours <= 0.0 {
            return Err(ScheduleError::InvalidCaptureTime(capture_hours));
        }
        if movie_seconds == 0 {
            return Err(ScheduleError::ZeroMovieDuration);
        }
        if framerate == 0 {
            return Err(ScheduleError::ZeroFramerate);
        }

        let capture_secs = (capture_hours * SECONDS_PER_HOUR) as u64;
        if capture_secs == 0 {
            return Err(ScheduleError::CaptureTooShort(capture_hours));
        }

        let movie_frames = u64::from(movie_seconds) * u64::from(framerate);
        let interval = capture_secs as f64 / movie_frames as f64;
        let interval_duration = Duration::try_from_secs_f64(interval)
            .map_err(|_| ScheduleError::IntervalTooLong(interval))?;
        let total_pics = (capture_secs as f64 / interval) as u64;

        Ok(Self {
            capture_hours,
            capture_secs,
            movie_frames,
            interval,
            interval_duration,
            total_pics,
        })
    }

    /// Requested capture time in hours.
    #[inline]
    pub fn capture_hours(&self) -> f64 {
        self.capture_hours
    }

    /// Capture time truncated to whole seconds.
    #[inline]
    pub fn capture_secs(&self) -> u64 {
        self.capture_secs
    }

    /// Frames the final movie needs (`movie_seconds * framerate`).
    #[inline]
    pub fn movie_frames(&self) -> u64 {
        self.movie_frames
    }

    /// Seconds between captures. Not rounded.
    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Expected number of pictures.
    #[inline]
    pub fn total_pics(&self) -> u64 {
        self.total_pics
    }

    pub fn interval_duration(&self) -> Duration {
        self.interval_duration
    }

    pub fn capture_duration(&self) -> Duration {
        Duration::from_secs(self.capture_secs)
    }

    /// `movie_frames - total_pics`; non-zero when the re-derived picture
    /// count lost a frame to rounding.
    pub fn frame_shortfall(&self) -> i64 {
        self.movie_frames as i64 - self.total_pics as i64
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a picture every {} seconds for {} hours, {} pictures",
            self.interval, self.capture_hours, self.total_pics
        )
    }
}
