//! Camera control and the capture loop.
//!
//! This module provides the camera abstraction, its configuration, the
//! output directory the stills land in, and the time-lapse session that ties
//! them to a [`Schedule`](crate::schedule::Schedule).

mod camera;
mod config;
mod frame;
mod guard;
mod output;
mod session;
mod still;

pub use camera::{Camera, CameraError, MockCamera, MOCK_FRAME};
pub use config::{
    CaptureConfig, ConfigError, Encoding, FileConfig, MetricsConfig, OutputConfig,
    ScheduleConfig, SnapshotConfig,
};
pub use frame::CapturedFrame;
pub use guard::CameraGuard;
pub use output::{OutputDir, OutputError};
pub use session::{Progress, SessionError, SessionReport, SessionState, TimelapseSession};
pub use still::StillCamera;
