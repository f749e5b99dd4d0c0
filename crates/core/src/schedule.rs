//! Fire-time arithmetic for recurring background jobs. All times are UTC.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// When a recurring job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// 00:00 on the first day of every month.
    Monthly,
    /// Every day at `hour:minute`.
    Daily { hour: u32, minute: u32 },
}

impl Schedule {
    /// A validated daily schedule.
    pub fn daily(hour: u32, minute: u32) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::Validation(format!(
                "Invalid daily schedule time {hour:02}:{minute:02}"
            )));
        }
        Ok(Self::Daily { hour, minute })
    }

    /// The first fire time strictly after `now`.
    ///
    /// Returns `None` only if the result is not representable (calendar
    /// overflow or an out-of-range daily time).
    pub fn next_fire_after(&self, now: Timestamp) -> Option<Timestamp> {
        match *self {
            Self::Monthly => {
                let (year, month) = if now.month() == 12 {
                    (now.year() + 1, 1)
                } else {
                    (now.year(), now.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
            Self::Daily { hour, minute } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
                let today = now.date_naive().and_time(time).and_utc();
                if today > now {
                    Some(today)
                } else {
                    today.checked_add_signed(Duration::days(1))
                }
            }
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Daily { hour, minute } => write!(f, "daily at {hour:02}:{minute:02} UTC"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
