//! Prometheus metrics for capture sessions.
//!
//! # Metrics Exposed
//!
//! - `timelapse_expected_frames` - Pictures the schedule expects to take
//! - `timelapse_capture_interval_seconds` - Seconds between captures
//! - `timelapse_capture_duration_seconds` - Total capture time
//! - `timelapse_frames_captured_total` - Stills written so far
//! - `timelapse_elapsed_seconds` - Capture time elapsed so far
//! - `timelapse_progress_percent` - Elapsed time as a percentage of the total
//! - `timelapse_session_state` - Session state code
//!
//! With the `metrics` feature the registry can be served over HTTP for a
//! headless Pi, see `MetricsServer`.
//!
//! # Example
//!
//! ```no_run
//! use pi_timelapse::metrics::MetricsRegistry;
//! use pi_timelapse::schedule::Schedule;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.set_schedule(&Schedule::compute(1.0, 60, 30).unwrap());
//! registry.record_frame();
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
