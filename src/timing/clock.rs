//! Wall-clock and monotonic time behind a trait.

use super::CancelToken;
use chrono::{Local, NaiveDateTime, TimeDelta};
use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Source of time for scheduling.
///
/// `now` is the local wall clock used for start times, `monotonic` measures
/// elapsed capture time and is unaffected by wall-clock adjustments.
pub trait Clock {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Time elapsed since an arbitrary fixed origin.
    fn monotonic(&self) -> Duration;

    /// Blocks the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock for testing.
///
/// Time only moves when something sleeps or calls [`MockClock::advance`].
/// An optional trigger cancels a token once virtual time reaches a given
/// offset, which simulates a user pressing ctrl+c at that moment.
#[derive(Debug)]
pub struct MockClock {
    start: NaiveDateTime,
    offset: Cell<Duration>,
    sleeps: Cell<u64>,
    cancel_at: RefCell<Option<(Duration, CancelToken)>>,
}

impl MockClock {
    /// Creates a clock whose wall time starts at `start`.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            offset: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
            cancel_at: RefCell::new(None),
        }
    }

    /// Cancels `token` as soon as virtual time reaches `offset`.
    pub fn cancel_at(&self, offset: Duration, token: CancelToken) {
        *self.cancel_at.borrow_mut() = Some((offset, token));
    }

    /// Moves virtual time forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
        if let Some((at, token)) = self.cancel_at.borrow().as_ref() {
            if self.offset.get() >= *at {
                token.cancel();
            }
        }
    }

    /// Number of calls to [`Clock::sleep`] so far.
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.get()
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        TimeDelta::from_std(self.offset.get())
            .ok()
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX)
    }

    fn monotonic(&self) -> Duration {
        self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 22)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_mock_clock_moves_on_sleep() {
        let clock = MockClock::new(start());
        clock.sleep(Duration::from_secs(90));

        assert_eq!(clock.monotonic(), Duration::from_secs(90));
        assert_eq!(
            clock.now(),
            NaiveDate::from_ymd_opt(2024, 3, 22)
                .unwrap()
                .and_hms_opt(12, 1, 30)
                .unwrap()
        );
        assert_eq!(clock.sleep_count(), 1);
    }

    #[test]
    fn test_mock_clock_cancel_trigger() {
        let clock = MockClock::new(start());
        let token = CancelToken::new();
        clock.cancel_at(Duration::from_secs(10), token.clone());

        clock.advance(Duration::from_secs(9));
        assert!(!token.is_cancelled());
        clock.advance(Duration::from_secs(1));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.monotonic();
        let b = clock.monotonic();
        assert!(b >= a);
    }
}
