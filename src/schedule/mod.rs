//! Capture schedule arithmetic.
//!
//! Converts the human-facing inputs (how long to record, how long the final
//! movie should be and at what framerate) into the interval between captures
//! and the number of pictures that interval yields.

mod calculator;

pub use calculator::{Schedule, ScheduleError, SECONDS_PER_HOUR};
