//! Next-departure computation.
//!
//! Answers "how long until the next bus leaves here?" and "how long is the
//! ride from here to there?" against the minute table of the current
//! calendar. Lookups never fail: a stop without a usable slot produces one of
//! the terminal [`Departure`] states instead.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Calendar, ClockTime, Stop, minute_values};

/// When the next departure from a stop leaves.
///
/// The variant order is the display order of search results: departures
/// with a known time first (soonest first), then stops whose schedule is
/// over for the day, then stops that do not run today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "status", content = "minutes", rename_all = "snake_case")]
pub enum Departure {
    /// Leaves in this many minutes; 0 means now.
    In(u32),
    /// No departure left after the current time today.
    BeyondSchedule,
    /// Today's calendar has no minute table for this stop.
    NotOperatingToday,
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Departure::In(0) => f.write_str("Departing right now!"),
            Departure::In(mins) => write!(f, "In {mins} min"),
            Departure::BeyondSchedule => f.write_str("Beyond schedule"),
            Departure::NotOperatingToday => f.write_str("Doesn't drive today"),
        }
    }
}

/// Departure from the origin of a ride plus the ride length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RideInfo {
    pub departure: Departure,
    /// Minutes from leaving the origin to reaching the destination.
    /// Only computed when the origin has a departure today.
    pub ride_mins: Option<u32>,
}

impl fmt::Display for RideInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.departure)?;
        if let Some(ride) = self.ride_mins {
            write!(f, " [{ride} min ride]")?;
        }
        Ok(())
    }
}

/// A matched departure slot in a stop's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Index into the hour table.
    pub hour_index: usize,
    /// Position of the label within the hour's minute cell.
    pub minute_index: usize,
    pub hour: u32,
    pub minute: u32,
}

impl Slot {
    /// Signed minutes from `(hour, minute)` to this slot.
    fn minutes_since(&self, hour: u32, minute: u32) -> i64 {
        (i64::from(self.hour) - i64::from(hour)) * 60 + i64::from(self.minute) - i64::from(minute)
    }
}

/// Find the first departure at or after `(hour, minute)`.
///
/// Scanning starts at the first hour not earlier than `hour`. Only that first
/// hour is compared against `minute`; later hours accept any label.
pub fn next_slot(
    hours: &[u32],
    cells: &[String],
    hour: u32,
    minute: u32,
) -> Result<Slot, Departure> {
    let first = hours
        .iter()
        .position(|h| *h >= hour)
        .ok_or(Departure::BeyondSchedule)?;

    if cells.is_empty() {
        return Err(Departure::NotOperatingToday);
    }

    let mut threshold = minute;
    for (hour_index, (slot_hour, cell)) in hours.iter().zip(cells).enumerate().skip(first) {
        if let Some((minute_index, slot_minute)) =
            minute_values(cell).find(|(_, m)| *m >= threshold)
        {
            return Ok(Slot {
                hour_index,
                minute_index,
                hour: *slot_hour,
                minute: slot_minute,
            });
        }
        threshold = 0;
    }

    Err(Departure::BeyondSchedule)
}

/// Next departure slot of a stop on the calendar of `now`.
pub fn next_departure(stop: &Stop, now: NaiveDateTime) -> Result<Slot, Departure> {
    let calendar = Calendar::for_date(now.date());
    let clock = ClockTime::of(now);
    next_slot(
        &stop.times.hours,
        stop.times.minutes_for(calendar),
        clock.hour(),
        clock.minute(),
    )
}

/// Minutes until the next departure from `stop`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use timetable_server::departure::{Departure, mins_to_next_bus};
/// use timetable_server::domain::{Stop, Times};
///
/// let stop = Stop {
///     id: 1,
///     line: 4,
///     direction: "Centrum".to_string(),
///     name: "Main St".to_string(),
///     times: Times {
///         hours: vec![8, 9],
///         work: vec!["00 15 30".to_string(), "00".to_string()],
///         ..Times::default()
///     },
/// };
///
/// // 2024-03-15 is a Friday
/// let at = |h, m| NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(h, m, 0).unwrap();
/// assert_eq!(mins_to_next_bus(&stop, at(8, 20)), Departure::In(10));
/// assert_eq!(mins_to_next_bus(&stop, at(9, 5)), Departure::BeyondSchedule);
/// ```
pub fn mins_to_next_bus(stop: &Stop, now: NaiveDateTime) -> Departure {
    let clock = ClockTime::of(now);
    match next_departure(stop, now) {
        // A slot earlier than now can only come from an hour table that still
        // wraps past midnight; that departure belongs to tomorrow.
        Ok(slot) => u32::try_from(slot.minutes_since(clock.hour(), clock.minute()))
            .map_or(Departure::BeyondSchedule, Departure::In),
        Err(state) => state,
    }
}

/// Ride length along consecutive stops of one run.
///
/// Follows the next departure from the first stop through each later stop's
/// own table. If a later stop has no matching slot the ride is cut short
/// there and the minutes accumulated so far are returned. Returns `None` if
/// the first stop has no departure today.
pub fn commute_length(stops: &[Stop], now: NaiveDateTime) -> Option<u32> {
    let (first, rest) = stops.split_first()?;
    let calendar = Calendar::for_date(now.date());
    let start = next_departure(first, now).ok()?;

    let (mut hour, mut minute) = (start.hour, start.minute);
    let mut total: u32 = 0;

    for stop in rest {
        let table = stop.times.minutes_for(calendar);
        let Ok(slot) = next_slot(&stop.times.hours, table, hour, minute) else {
            break;
        };
        let Some(next) = u32::try_from(slot.minutes_since(hour, minute))
            .ok()
            .and_then(|elapsed| total.checked_add(elapsed))
        else {
            break;
        };
        total = next;
        hour = slot.hour;
        minute = slot.minute;
    }

    Some(total)
}

/// Departure description for a single stop.
pub fn describe_stop(stop: &Stop, now: NaiveDateTime) -> String {
    mins_to_next_bus(stop, now).to_string()
}

/// Departure and ride length for a ride over `stops`, origin first.
pub fn ride_info(stops: &[Stop], now: NaiveDateTime) -> RideInfo {
    let Some(origin) = stops.first() else {
        return RideInfo {
            departure: Departure::BeyondSchedule,
            ride_mins: None,
        };
    };

    let departure = mins_to_next_bus(origin, now);
    let ride_mins = match departure {
        Departure::In(_) => commute_length(stops, now),
        _ => None,
    };

    RideInfo {
        departure,
        ride_mins,
    }
}
