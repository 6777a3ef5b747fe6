//! Delayed start.
//!
//! A session may be asked to begin at a wall-clock time built from partial
//! date/time overrides. [`StartTimeArgs`] turns those overrides into a
//! timestamp and [`StartGate`] blocks until it is reached.

mod gate;
mod time_args;

pub use gate::{GateOutcome, StartGate, DEFAULT_POLL_INTERVAL};
pub use time_args::{StartTimeArgs, StartTimeError};
