//! Service-day time handling.
//!
//! Schedules express times as "HH:MM:SS" strings measured from midnight of
//! the service day. Trips running past midnight keep counting (e.g.
//! "25:10:00"), so a single trip's times are always monotone and the routing
//! core never needs a date.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of the service day, in seconds since midnight.
///
/// Values of 24:00:00 and beyond are valid and mean "the following calendar
/// day" for trips that run past midnight.
///
/// # Examples
///
/// ```
/// use transit_server::domain::DayTime;
///
/// let t = DayTime::parse("10:20:00").unwrap();
/// assert_eq!(t.seconds(), 37_200);
/// assert_eq!(t.to_string(), "10:20:00");
///
/// // Past-midnight times keep counting
/// let late = DayTime::parse("25:05:00").unwrap();
/// assert!(late > t);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DayTime(u32);

impl DayTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: DayTime = DayTime(0);

    /// Largest representable time; used as "unreachable".
    pub const MAX: DayTime = DayTime(u32::MAX);

    /// Create a time from seconds since midnight.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a time from hours, minutes and seconds.
    ///
    /// Hours may exceed 23 for past-midnight service.
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse "HH:MM:SS" (or "H:MM:SS").
    ///
    /// Hours are not capped at 23, minutes and seconds must be below 60.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');

        let hours = parts
            .next()
            .filter(|p| !p.is_empty() && p.len() <= 3)
            .ok_or_else(|| TimeError::new("expected HH:MM:SS format"))?;
        let minutes = parts
            .next()
            .filter(|p| p.len() == 2)
            .ok_or_else(|| TimeError::new("expected two minute digits"))?;
        let seconds = parts
            .next()
            .filter(|p| p.len() == 2)
            .ok_or_else(|| TimeError::new("expected two second digits"))?;

        if parts.next().is_some() {
            return Err(TimeError::new("expected HH:MM:SS format"));
        }

        let hours: u32 = parse_digits(hours).ok_or_else(|| TimeError::new("invalid hour"))?;
        let minutes: u32 =
            parse_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        let seconds: u32 =
            parse_digits(seconds).ok_or_else(|| TimeError::new("invalid second digits"))?;

        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Returns the number of seconds since midnight.
    pub const fn seconds(&self) -> u32 {
        self.0
    }

    /// Add a number of seconds, saturating at [`DayTime::MAX`].
    pub const fn saturating_add_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Subtract a number of seconds, saturating at midnight.
    pub const fn saturating_sub_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub const fn secs_since(&self, earlier: DayTime) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<NaiveTime> for DayTime {
    fn from(t: NaiveTime) -> Self {
        DayTime(t.num_seconds_from_midnight())
    }
}

impl Add<Duration> for DayTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let secs = rhs.num_seconds().clamp(0, u32::MAX as i64) as u32;
        self.saturating_add_secs(secs)
    }
}

impl Sub for DayTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration::seconds(self.0 as i64 - rhs.0 as i64)
    }
}

impl FromStr for DayTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == DayTime::MAX {
            return f.write_str("--:--:--");
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

impl fmt::Debug for DayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayTime({self})")
    }
}

impl Serialize for DayTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DayTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(DayTime::parse("00:00:00").unwrap(), DayTime::MIDNIGHT);
        assert_eq!(DayTime::parse("10:20:30").unwrap().seconds(), 37_230);
        assert_eq!(DayTime::parse("9:05:00").unwrap(), DayTime::from_hms(9, 5, 0));
        assert_eq!(DayTime::parse(" 23:59:59 ").unwrap().seconds(), 86_399);
    }

    #[test]
    fn parse_past_midnight() {
        let t = DayTime::parse("25:10:00").unwrap();
        assert_eq!(t.to_string(), "25:10:00");
        assert_eq!(t.seconds(), 25 * 3600 + 10 * 60);
    }

    #[test]
    fn reject_bad_formats() {
        assert!(DayTime::parse("").is_err());
        assert!(DayTime::parse("10:20").is_err());
        assert!(DayTime::parse("10:2:00").is_err());
        assert!(DayTime::parse("10:20:00:00").is_err());
        assert!(DayTime::parse("10:60:00").is_err());
        assert!(DayTime::parse("10:00:60").is_err());
        assert!(DayTime::parse("aa:00:00").is_err());
        assert!(DayTime::parse("-1:00:00").is_err());
    }

    #[test]
    fn display_pads() {
        assert_eq!(DayTime::from_hms(9, 5, 7).to_string(), "09:05:07");
        assert_eq!(DayTime::MAX.to_string(), "--:--:--");
    }

    #[test]
    fn arithmetic() {
        let t = DayTime::from_hms(10, 0, 0);
        assert_eq!(t + Duration::minutes(20), DayTime::from_hms(10, 20, 0));
        assert_eq!(DayTime::from_hms(10, 20, 0) - t, Duration::minutes(20));
        assert_eq!(t.saturating_add_secs(90), DayTime::from_hms(10, 1, 30));
        assert_eq!(DayTime::MAX.saturating_add_secs(1), DayTime::MAX);
        assert_eq!(DayTime::from_seconds(5).saturating_sub_secs(10), DayTime::MIDNIGHT);
        assert_eq!(DayTime::from_hms(10, 20, 0).secs_since(t), 1200);
        assert_eq!(t.secs_since(DayTime::from_hms(10, 20, 0)), 0);
    }

    #[test]
    fn from_naive_time() {
        let t: DayTime = NaiveTime::from_hms_opt(9, 55, 0).unwrap().into();
        assert_eq!(t, DayTime::from_hms(9, 55, 0));
    }

    #[test]
    fn serde_uses_hhmmss() {
        let t = DayTime::from_hms(10, 20, 0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"10:20:00\"");
        let back: DayTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<DayTime>("\"10:99:00\"").is_err());
    }
}
