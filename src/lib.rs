//! Raspberry Pi Time-Lapse Library
//!
//! Periodic still capture with the Raspberry Pi camera module, for
//! time-lapse movies and quick animated snapshots.
//!
//! # Architecture
//!
//! ```text
//! schedule ──► start gate ──► capture session ──► numbered stills
//!                   │               │
//!                 clock        camera (scoped)
//! ```
//!
//! A [`Schedule`] turns "record for N hours, for an M second movie at F fps"
//! into the interval between captures. A [`StartGate`] optionally holds the
//! session until a wall-clock time. The [`TimelapseSession`] then owns the
//! camera for the whole recording and releases it on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use pi_timelapse::{
//!     capture::{CaptureConfig, MockCamera, OutputConfig, TimelapseSession},
//!     schedule::Schedule,
//!     timing::{CancelToken, SystemClock},
//! };
//!
//! let schedule = Schedule::compute(1.0, 60, 30).unwrap();
//! let mut session =
//!     TimelapseSession::new(schedule, CaptureConfig::default(), OutputConfig::default());
//!
//! let mut camera = MockCamera::new();
//! let report = session
//!     .run(&mut camera, &SystemClock::new(), &CancelToken::new())
//!     .unwrap();
//! println!("captured {} frames", report.frames_captured);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod metrics;
pub mod schedule;
pub mod snapshot;
pub mod start;
pub mod timing;

// Re-export commonly used types at crate root
pub use capture::{
    Camera, CaptureConfig, FileConfig, MockCamera, SessionReport, SessionState, StillCamera,
    TimelapseSession,
};
pub use schedule::{Schedule, ScheduleError};
pub use snapshot::Snapshot;
pub use start::{StartGate, StartTimeArgs};
pub use timing::{CancelToken, Clock, SystemClock};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
