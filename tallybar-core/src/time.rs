//! Reset timestamp parsing and countdown formatting.
//!
//! The usage API reports window resets as `YYYY-MM-DDTHH:MM:SS` strings,
//! always in UTC. [`Timestamp`] keeps the six numeric components as-is and
//! converts to epoch seconds only when a countdown is computed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Timestamp
// ============================================================================

/// A reset timestamp split into its six date-time components.
///
/// Component values are stored exactly as parsed and are **not**
/// range-checked: the API is the source of truth, and an out-of-range
/// component (say, month 13) flows through to the epoch arithmetic rather
/// than failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Calendar year.
    pub year: i64,
    /// Month (1-12 from a well-formed payload).
    pub month: i64,
    /// Day of month.
    pub day: i64,
    /// Hour (24h).
    pub hour: i64,
    /// Minute.
    pub minute: i64,
    /// Second.
    pub second: i64,
}

impl Timestamp {
    /// Parses a `YYYY-MM-DDTHH:MM:SS` string.
    ///
    /// A trailing timezone suffix (`Z`, `+00:00`) or fractional-second part
    /// is ignored; the API always emits UTC.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTimestamp` if fewer than six numeric
    /// components are present.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidTimestamp(s.to_string());

        let (date, time) = s.split_once('T').ok_or_else(invalid)?;

        let mut date_parts = date.splitn(3, '-');
        let year = leading_int(date_parts.next()).ok_or_else(invalid)?;
        let month = leading_int(date_parts.next()).ok_or_else(invalid)?;
        let day = leading_int(date_parts.next()).ok_or_else(invalid)?;

        let mut time_parts = time.splitn(3, ':');
        let hour = leading_int(time_parts.next()).ok_or_else(invalid)?;
        let minute = leading_int(time_parts.next()).ok_or_else(invalid)?;
        let second = leading_int(time_parts.next()).ok_or_else(invalid)?;

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Seconds since the Unix epoch, computed without component validation.
    pub fn unix_seconds(&self) -> i64 {
        days_from_civil(self.year, self.month, self.day) * 86_400
            + self.hour * 3_600
            + self.minute * 60
            + self.second
    }

    /// Seconds from `now` until this timestamp (negative when past).
    pub fn seconds_from(&self, now: DateTime<Utc>) -> i64 {
        self.unix_seconds() - now.timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimestampVisitor;

        impl Visitor<'_> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a YYYY-MM-DDTHH:MM:SS timestamp string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
                Timestamp::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TimestampVisitor)
    }
}

/// Parses the leading decimal digits of a field, if any.
fn leading_int(field: Option<&str>) -> Option<i64> {
    let field = field?;
    let end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    field[..end].parse().ok()
}

/// Days since the Unix epoch for a civil date (Gregorian era arithmetic).
///
/// Accepts out-of-range months and days; they wrap arithmetically, so a
/// month 13 lands in January of the following year.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9).rem_euclid(12);
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

// ============================================================================
// Countdown Formatting
// ============================================================================

/// Formats the time remaining until `target` as a compact countdown.
///
/// Shows the two most significant units of days/hours/minutes: `"3d 2h"`,
/// `"2h 14m"`, or `"45m"`. Seconds are never shown, and a target at or
/// before `now` yields `"now"`.
pub fn format_remaining(target: &Timestamp, now: DateTime<Utc>) -> String {
    format_duration_secs(target.seconds_from(now))
}

/// Formats a whole-second duration as a compact countdown.
pub fn format_duration_secs(secs: i64) -> String {
    if secs <= 0 {
        return "now".to_string();
    }

    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let mins = (secs % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

// ============================================================================
// Tests
// ============================================================================
