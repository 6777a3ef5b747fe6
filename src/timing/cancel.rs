//! Cooperative cancellation driven by ctrl+c.

use super::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Longest uninterrupted sleep; bounds how late a cancellation is noticed.
pub const CANCEL_POLL: Duration = Duration::from_millis(250);

/// Returned when a wait was interrupted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled by user")]
pub struct Cancelled;

/// Shared flag set once by the signal handler and polled by waiters.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Installs a SIGINT/SIGTERM handler that trips the returned token.
///
/// Can only be called once per process.
pub fn install_ctrlc_handler() -> Result<CancelToken, ctrlc::Error> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("Interrupt received, stopping");
        handler_token.cancel();
    })?;
    Ok(token)
}

/// Sleeps for `duration` in slices of at most [`CANCEL_POLL`], returning
/// early with `Err(Cancelled)` once `token` is tripped.
pub fn sleep_cancellable<C: Clock + ?Sized>(
    clock: &C,
    token: &CancelToken,
    duration: Duration,
) -> Result<(), Cancelled> {
    let deadline = clock.monotonic() + duration;
    loop {
        token.check()?;
        let now = clock.monotonic();
        if now >= deadline {
            return Ok(());
        }
        clock.sleep((deadline - now).min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::MockClock;
    use chrono::NaiveDate;

    fn clock() -> MockClock {
        MockClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_sleep_runs_to_completion() {
        let clock = clock();
        let token = CancelToken::new();

        sleep_cancellable(&clock, &token, Duration::from_secs(2)).unwrap();
        assert_eq!(clock.monotonic(), Duration::from_secs(2));
        assert_eq!(clock.sleep_count(), 8);
    }

    #[test]
    fn test_sleep_interrupted() {
        let clock = clock();
        let token = CancelToken::new();
        clock.cancel_at(Duration::from_secs(1), token.clone());

        let result = sleep_cancellable(&clock, &token, Duration::from_secs(60));
        assert_eq!(result, Err(Cancelled));
        assert!(clock.monotonic() < Duration::from_secs(2));
    }

    #[test]
    fn test_already_cancelled_does_not_sleep() {
        let clock = clock();
        let token = CancelToken::new();
        token.cancel();

        assert!(sleep_cancellable(&clock, &token, Duration::from_secs(5)).is_err());
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_zero_sleep() {
        let clock = clock();
        let token = CancelToken::new();
        sleep_cancellable(&clock, &token, Duration::ZERO).unwrap();
        assert_eq!(clock.sleep_count(), 0);
    }
}
