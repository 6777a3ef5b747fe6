//! Blocking wait for a scheduled start time.

use crate::timing::{sleep_cancellable, CancelToken, Cancelled, Clock};
use chrono::NaiveDateTime;
use std::time::Duration;
use tracing::{debug, info};

/// How often the wall clock is re-read while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How the gate was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No start time, or it was already in the past.
    Immediate,
    /// Blocked for the given (clock) duration before the start time arrived.
    Waited(Duration),
}

/// Holds capture back until a wall-clock time.
#[derive(Debug, Clone)]
pub struct StartGate {
    target: Option<NaiveDateTime>,
    poll_interval: Duration,
}

impl Default for StartGate {
    fn default() -> Self {
        Self::immediate()
    }
}

impl StartGate {
    pub fn new(target: Option<NaiveDateTime>) -> Self {
        Self {
            target,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// A gate that never blocks.
    pub fn immediate() -> Self {
        Self::new(None)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn target(&self) -> Option<NaiveDateTime> {
        self.target
    }

    /// True when a start time is configured.
    pub fn is_delayed(&self) -> bool {
        self.target.is_some()
    }

    /// Blocks until the target time, returning immediately if there is none
    /// or it has passed. Fails with [`Cancelled`] if `cancel` trips first.
    pub fn wait<C: Clock + ?Sized>(
        &self,
        clock: &C,
        cancel: &CancelToken,
    ) -> Result<GateOutcome, Cancelled> {
        let Some(target) = self.target else {
            return Ok(GateOutcome::Immediate);
        };
        if clock.now() >= target {
            debug!(%target, "start time already passed");
            return Ok(GateOutcome::Immediate);
        }

        info!(%target, "Will start recording time-lapse on {}", target);
        let started = clock.monotonic();
        loop {
            cancel.check()?;
            // Re-read the wall clock every poll; it may be stepped by NTP.
            let now = clock.now();
            if now >= target {
                break;
            }
            let remaining = (target - now).to_std().unwrap_or_default();
            sleep_cancellable(clock, cancel, remaining.min(self.poll_interval))?;
        }

        Ok(GateOutcome::Waited(clock.monotonic() - started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::MockClock;
    use chrono::{NaiveDate, TimeDelta};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 22)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_no_target_is_immediate() {
        let clock = MockClock::new(start());
        let outcome = StartGate::immediate()
            .wait(&clock, &CancelToken::new())
            .unwrap();

        assert_eq!(outcome, GateOutcome::Immediate);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_past_target_is_immediate() {
        let clock = MockClock::new(start());
        let gate = StartGate::new(Some(start() - TimeDelta::minutes(5)));

        assert_eq!(
            gate.wait(&clock, &CancelToken::new()),
            Ok(GateOutcome::Immediate)
        );
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_future_target_blocks_until_reached() {
        let clock = MockClock::new(start());
        let target = start() + TimeDelta::seconds(90);
        let gate = StartGate::new(Some(target));

        let outcome = gate.wait(&clock, &CancelToken::new()).unwrap();

        assert_eq!(outcome, GateOutcome::Waited(Duration::from_secs(90)));
        assert!(clock.now() >= target);
    }

    #[test]
    fn test_sub_second_target_not_overshot() {
        let clock = MockClock::new(start());
        let target = start() + TimeDelta::milliseconds(1500);
        let gate = StartGate::new(Some(target)).with_poll_interval(Duration::from_secs(10));

        gate.wait(&clock, &CancelToken::new()).unwrap();
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_cancel_during_wait() {
        let clock = MockClock::new(start());
        let token = CancelToken::new();
        clock.cancel_at(Duration::from_secs(30), token.clone());
        let gate = StartGate::new(Some(start() + TimeDelta::hours(1)));

        assert_eq!(gate.wait(&clock, &token), Err(Cancelled));
        assert!(clock.now() < start() + TimeDelta::minutes(1));
    }
}
