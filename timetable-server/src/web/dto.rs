//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::departure::{Departure, Slot};
use crate::domain::{Calendar, Stop};
use crate::search::Connection;
use crate::store::StoreStatus;

/// Free-text query, as used by stop search and the one-sided connection
/// browsers.
#[derive(Debug, Deserialize)]
pub struct TextQuery {
    /// What the user typed
    #[serde(default)]
    pub q: String,

    /// Time in HH:MM format (defaults to now)
    pub at: Option<String>,
}

/// Request for connections between two stops.
#[derive(Debug, Deserialize)]
pub struct ConnectionQuery {
    /// Origin stop name
    #[serde(default)]
    pub from: String,

    /// Destination stop name
    #[serde(default)]
    pub to: String,

    /// Time in HH:MM format (defaults to now)
    pub at: Option<String>,
}

/// Optional time override for a single stop's timetable.
#[derive(Debug, Default, Deserialize)]
pub struct AtQuery {
    /// Time in HH:MM format (defaults to now)
    pub at: Option<String>,
}

/// Loading progress of the current timetable.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Stops decoded so far
    pub stops: usize,

    /// Whether the dataset is fully loaded
    pub complete: bool,

    /// Why loading failed, if it did
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn new(status: StoreStatus, error: Option<String>) -> Self {
        Self {
            stops: status.len,
            complete: status.complete,
            error,
        }
    }
}

/// A stop in search results.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: u64,
    pub line: u32,
    pub direction: String,
    pub name: String,

    /// Next departure from this stop
    pub departure: Departure,

    /// e.g. "In 5 min"
    pub description: String,
}

impl StopResult {
    /// Create from a stop and its next departure.
    pub fn new(stop: &Stop, departure: Departure) -> Self {
        Self {
            id: stop.id,
            line: stop.line,
            direction: stop.direction.clone(),
            name: stop.name.clone(),
            departure,
            description: departure.to_string(),
        }
    }
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<StopResult>,
}

/// A connection in search results.
#[derive(Debug, Serialize)]
pub struct ConnectionResult {
    /// Id of the stop the ride leaves from
    pub origin_id: u64,
    pub line: u32,
    pub direction: String,

    /// "origin -> destination"
    pub path: String,

    /// Next departure from the origin
    pub departure: Departure,

    /// Ride length in minutes, when the origin runs today
    pub ride_mins: Option<u32>,

    /// e.g. "In 5 min [12 min ride]"
    pub description: String,
}

impl From<Connection> for ConnectionResult {
    fn from(c: Connection) -> Self {
        Self {
            origin_id: c.origin.id,
            line: c.line,
            direction: c.origin.direction,
            path: c.path,
            departure: c.info.departure,
            ride_mins: c.info.ride_mins,
            description: c.description,
        }
    }
}

/// Response for connection search.
#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionResult>,
}

impl ConnectionsResponse {
    pub fn new(connections: Vec<Connection>) -> Self {
        Self {
            connections: connections.into_iter().map(ConnectionResult::from).collect(),
        }
    }
}

/// One hour of a stop's timetable.
#[derive(Debug, Serialize)]
pub struct HourRow {
    /// Zero-padded hour, e.g. "08"
    pub hour: String,

    /// Minute labels as published, annotations included
    pub minutes: Vec<String>,
}

/// Position of the next departure within [`StopTimesResponse::hours`].
#[derive(Debug, Serialize)]
pub struct NextSlot {
    /// Row index
    pub hour_index: usize,

    /// Index into the row's minutes
    pub minute_index: usize,
}

impl From<Slot> for NextSlot {
    fn from(slot: Slot) -> Self {
        Self {
            hour_index: slot.hour_index,
            minute_index: slot.minute_index,
        }
    }
}

/// Full timetable of one stop for the calendar that applies today.
#[derive(Debug, Serialize)]
pub struct StopTimesResponse {
    pub id: u64,
    pub line: u32,
    pub direction: String,
    pub name: String,

    /// "work", "saturday" or "holiday"
    pub calendar: String,

    /// Empty when the stop does not run on this calendar
    pub hours: Vec<HourRow>,

    /// Next departure, if there is one today
    pub next: Option<NextSlot>,

    pub departure: Departure,
    pub description: String,
}

impl StopTimesResponse {
    /// Build the timetable view of `stop` on `calendar`.
    pub fn new(stop: &Stop, calendar: Calendar, next: Option<Slot>, departure: Departure) -> Self {
        let hours = stop
            .times
            .hours
            .iter()
            .zip(stop.times.minutes_for(calendar))
            .map(|(hour, cell)| HourRow {
                hour: format!("{:02}", hour),
                minutes: cell.split_whitespace().map(str::to_string).collect(),
            })
            .collect();

        Self {
            id: stop.id,
            line: stop.line,
            direction: stop.direction.clone(),
            name: stop.name.clone(),
            calendar: calendar.to_string(),
            hours,
            next: next.map(NextSlot::from),
            departure,
            description: departure.to_string(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::departure::RideInfo;
    use crate::domain::Times;

    fn make_stop() -> Stop {
        Stop {
            id: 42,
            line: 7,
            direction: "Centrum".into(),
            name: "Rynek".into(),
            times: Times {
                hours: vec![5, 6],
                work: vec!["10 40a".into(), "".into()],
                saturday: Vec::new(),
                holiday: vec!["30".into(), "30".into()],
            },
        }
    }

    #[test]
    fn stop_result_from_stop() {
        let result = StopResult::new(&make_stop(), Departure::In(3));
        assert_eq!(result.id, 42);
        assert_eq!(result.description, "In 3 min");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["departure"]["status"], "in");
        assert_eq!(json["departure"]["minutes"], 3);
    }

    #[test]
    fn connection_result_from_connection() {
        let stop = make_stop();
        let info = RideInfo {
            departure: Departure::In(0),
            ride_mins: Some(9),
        };
        let connection = Connection {
            origin: stop.clone(),
            line: stop.line,
            path: "Rynek -> Dworzec".into(),
            info,
            description: info.to_string(),
        };

        let result = ConnectionResult::from(connection);
        assert_eq!(result.origin_id, 42);
        assert_eq!(result.direction, "Centrum");
        assert_eq!(result.ride_mins, Some(9));
        assert_eq!(result.description, "Departing right now! [9 min ride]");
    }

    #[test]
    fn timetable_rows_keep_annotations() {
        let view = StopTimesResponse::new(&make_stop(), Calendar::Workday, None, Departure::BeyondSchedule);

        assert_eq!(view.calendar, "work");
        assert_eq!(view.hours.len(), 2);
        assert_eq!(view.hours[0].hour, "05");
        assert_eq!(view.hours[0].minutes, vec!["10", "40a"]);
        assert!(view.hours[1].minutes.is_empty());
        assert!(view.next.is_none());
    }

    #[test]
    fn timetable_without_service() {
        let view = StopTimesResponse::new(
            &make_stop(),
            Calendar::Saturday,
            None,
            Departure::NotOperatingToday,
        );
        assert!(view.hours.is_empty());
        assert_eq!(view.description, "Doesn't drive today");
    }
}
