//! Time sources and cooperative cancellation.
//!
//! Everything that waits (the delayed-start gate, the warm-up delay and the
//! capture interval) goes through a [`Clock`] and checks a [`CancelToken`],
//! so tests can drive whole sessions on virtual time.

mod cancel;
mod clock;

pub use cancel::{install_ctrlc_handler, sleep_cancellable, CancelToken, Cancelled, CANCEL_POLL};
pub use clock::{Clock, MockClock, SystemClock};
