//! Start timestamp from partial date/time overrides.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a start timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartTimeError {
    #[error("invalid start date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("invalid start time {hour:02}:{minute:02}:{second:02}")]
    InvalidTime { hour: u32, minute: u32, second: u32 },
}

/// Optional overrides for each component of the start time.
///
/// Omitted year, month, day and hour take the current value; omitted minute
/// and second are 0. So `hour = 22` alone means "today at 22:00:00", not
/// "today at 22 and whatever the minute hand shows now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartTimeArgs {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl StartTimeArgs {
    /// True when no component was given, meaning "start immediately".
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.hour.is_none()
            && self.minute.is_none()
            && self.second.is_none()
    }

    /// Fills the missing components from `now` and builds the timestamp.
    ///
    /// Returns `Ok(None)` when nothing was overridden.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>, StartTimeError> {
        if self.is_empty() {
            return Ok(None);
        }

        let year = self.year.unwrap_or_else(|| now.year());
        let month = self.month.unwrap_or_else(|| now.month());
        let day = self.day.unwrap_or_else(|| now.day());
        let hour = self.hour.unwrap_or_else(|| now.hour());
        let minute = self.minute.unwrap_or(0);
        let second = self.second.unwrap_or(0);

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(StartTimeError::InvalidDate { year, month, day })?;
        let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or(
            StartTimeError::InvalidTime {
                hour,
                minute,
                second,
            },
        )?;

        Ok(Some(date.and_time(time)))
    }

    /// Overlays the components set in `other` on top of `self`.
    pub fn merged_with(self, other: StartTimeArgs) -> Self {
        Self {
            year: other.year.or(self.year),
            month: other.month.or(self.month),
            day: other.day.or(self.day),
            hour: other.hour.or(self.hour),
            minute: other.minute.or(self.minute),
            second: other.second.or(self.second),
        }
    }
}
