//! Timetable rows.
//!
//! The dataset ships every stop of every line as one JSON object. This module
//! holds the wire shape of those objects and the validated [`Stop`] the rest
//! of the crate works with.

use serde::{Deserialize, Serialize};

use super::Calendar;

/// Error returned when a decoded record violates the timetable invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop {id}: {reason}")]
pub struct InvalidStop {
    id: u64,
    reason: String,
}

impl InvalidStop {
    fn new(id: u64, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }

    /// The id of the offending record.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One stop record as it appears in the dataset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StopDto {
    pub id: u64,
    pub line: u32,
    pub direction: String,
    pub stop_name: String,
    pub times: TimesDto,
}

/// Departure table of a stop as it appears in the dataset.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimesDto {
    pub hour: Vec<String>,
    #[serde(default)]
    pub work: Vec<String>,
    #[serde(default)]
    pub saturday: Vec<String>,
    #[serde(default)]
    pub holiday: Vec<String>,
}

/// A single timetable row: one line, one direction, one physical stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub id: u64,
    pub line: u32,
    pub direction: String,
    pub name: String,
    pub times: Times,
}

/// Departure table of a stop.
///
/// `hours` lists the service hours of one day. Each calendar table is either
/// empty (no service on that kind of day) or index-aligned with `hours`, one
/// cell per hour holding whitespace-separated minute labels such as
/// `"05 25a 45"`. Annotation letters are kept for display and ignored for
/// timing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Times {
    pub hours: Vec<u32>,
    pub work: Vec<String>,
    pub saturday: Vec<String>,
    pub holiday: Vec<String>,
}

impl Times {
    /// Minute cells that apply on the given calendar.
    pub fn minutes_for(&self, calendar: Calendar) -> &[String] {
        match calendar {
            Calendar::Workday => &self.work,
            Calendar::Saturday => &self.saturday,
            Calendar::Holiday => &self.holiday,
        }
    }
}

impl TryFrom<StopDto> for Stop {
    type Error = InvalidStop;

    fn try_from(dto: StopDto) -> Result<Self, Self::Error> {
        let id = dto.id;

        if dto.times.hour.is_empty() {
            return Err(InvalidStop::new(id, "empty hour table"));
        }

        let hours = dto
            .times
            .hour
            .iter()
            .map(|label| {
                parse_hour(label)
                    .ok_or_else(|| InvalidStop::new(id, format!("bad hour label {label:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (name, cells) in [
            ("work", &dto.times.work),
            ("saturday", &dto.times.saturday),
            ("holiday", &dto.times.holiday),
        ] {
            validate_calendar(id, name, cells, hours.len())?;
        }

        Ok(Self {
            id,
            line: dto.line,
            direction: dto.direction,
            name: dto.stop_name,
            times: Times {
                hours,
                work: dto.times.work,
                saturday: dto.times.saturday,
                holiday: dto.times.holiday,
            },
        })
    }
}

fn parse_hour(label: &str) -> Option<u32> {
    let label = label.trim();
    if label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    label.parse().ok().filter(|h| *h < 24)
}

fn validate_calendar(
    id: u64,
    name: &str,
    cells: &[String],
    hours: usize,
) -> Result<(), InvalidStop> {
    if cells.is_empty() {
        return Ok(());
    }

    if cells.len() != hours {
        return Err(InvalidStop::new(
            id,
            format!("{name} table has {} cells for {hours} hours", cells.len()),
        ));
    }

    for cell in cells {
        for label in cell.split_whitespace() {
            let digits = strip_annotations(label);
            let in_range = digits.parse::<u32>().is_ok_and(|m| m < 60);
            if !digits.is_empty() && !in_range {
                return Err(InvalidStop::new(
                    id,
                    format!("bad minute label {label:?} in {name} table"),
                ));
            }
        }
    }

    Ok(())
}

/// Strip annotation characters surrounding a minute label.
///
/// ```
/// use timetable_server::domain::strip_annotations;
///
/// assert_eq!(strip_annotations("25a"), "25");
/// assert_eq!(strip_annotations("k05"), "05");
/// assert_eq!(strip_annotations("x"), "");
/// ```
pub fn strip_annotations(label: &str) -> &str {
    label.trim_matches(|c: char| !c.is_ascii_digit())
}

/// Numeric minutes of a cell, paired with their position in the cell.
///
/// Labels that carry no digits at all are skipped.
pub fn minute_values(cell: &str) -> impl Iterator<Item = (usize, u32)> + '_ {
    cell.split_whitespace()
        .enumerate()
        .filter_map(|(idx, label)| strip_annotations(label).parse().ok().map(|m| (idx, m)))
}
