//! Wall-clock time and service calendars.
//!
//! Timetables are published per kind of day rather than per date, so a query
//! only needs the time of day and which calendar applies to the current date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use std::fmt;

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

/// Which minute table of a stop applies on a given day.
///
/// Public holidays are not modelled: Sunday stands in for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
    Workday,
    Saturday,
    Holiday,
}

impl Calendar {
    /// Calendar for a day of the week.
    pub fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => Calendar::Saturday,
            Weekday::Sun => Calendar::Holiday,
            _ => Calendar::Workday,
        }
    }

    /// Calendar for a date.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_weekday(date.weekday())
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Calendar::Workday => "work",
            Calendar::Saturday => "saturday",
            Calendar::Holiday => "holiday",
        };
        f.write_str(name)
    }
}

/// A time of day with minute precision.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::ClockTime;
///
/// let t = ClockTime::parse_hhmm("08:20").unwrap();
/// assert_eq!((t.hour(), t.minute()), (8, 20));
/// assert_eq!(t.to_string(), "08:20");
///
/// assert!(ClockTime::parse_hhmm("24:00").is_err());
/// assert!(ClockTime::parse_hhmm("0820").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    /// Create a time of day, rejecting out-of-range components.
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self { hour, minute })
    }

    /// Parse "HH:MM" (one or two hour digits are accepted).
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| TimeError::new("expected HH:MM format"))?;

        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let hour = parse_digits(hour).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_digits(minute).ok_or_else(|| TimeError::new("invalid minute digits"))?;

        Self::new(hour, minute)
    }

    /// Time of day of a local date-time.
    pub fn of(datetime: NaiveDateTime) -> Self {
        Self {
            hour: datetime.hour(),
            minute: datetime.minute(),
        }
    }

    /// This time of day on `date`.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        // Components are range-checked on construction
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN);
        date.and_time(time)
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
