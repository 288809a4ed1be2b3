//! Same-route connection search.
//!
//! The dataset lists the stops of each line and direction consecutively, in
//! travel order. A maximal block of such stops is a *run*; a connection is
//! any pair of stops where the origin precedes the destination within one
//! run, so no transfers are considered.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::departure::{RideInfo, ride_info};
use crate::domain::Stop;

use super::config::SearchConfig;
use super::stops::NameMatcher;

/// A ride between two stops of the same run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    /// Where the ride starts.
    pub origin: Stop,
    /// Line number of the run.
    pub line: u32,
    /// "origin -> destination"
    pub path: String,
    /// Next departure from the origin and the ride length.
    pub info: RideInfo,
    /// Human-readable rendering of `info`.
    pub description: String,
}

impl Connection {
    /// Build a connection over `ride`, origin first and destination last.
    ///
    /// Returns `None` for an empty slice.
    pub fn over(ride: &[Stop], now: NaiveDateTime) -> Option<Self> {
        let origin = ride.first()?;
        let destination = ride.last()?;
        let info = ride_info(ride, now);

        Some(Self {
            origin: origin.clone(),
            line: origin.line,
            path: format!("{} -> {}", origin.name, destination.name),
            info,
            description: info.to_string(),
        })
    }
}

/// Split stops into runs of the same line and direction.
pub fn runs(stops: &[Stop]) -> impl Iterator<Item = &[Stop]> {
    stops.chunk_by(|a, b| a.line == b.line && a.direction == b.direction)
}

/// Connections from stops named like `from` to later stops named like `to`.
///
/// Within each run the first stop matching `from` is the origin, and every
/// later stop of that run matching `to` yields one connection.
pub fn find_connections(
    from: &str,
    to: &str,
    stops: &[Stop],
    now: NaiveDateTime,
    config: &SearchConfig,
) -> Vec<Connection> {
    let mut from_matcher = NameMatcher::new(from, config.threshold);
    let mut to_matcher = NameMatcher::new(to, config.threshold);
    if from_matcher.is_empty() || to_matcher.is_empty() {
        return Vec::new();
    }

    let mut connections = Vec::new();
    for run in runs(stops) {
        let Some(start) = run.iter().position(|s| from_matcher.matches(&s.name)) else {
            continue;
        };

        for (end, stop) in run.iter().enumerate().skip(start + 1) {
            if to_matcher.matches(&stop.name) {
                connections.extend(Connection::over(&run[start..=end], now));
            }
        }
    }

    connections
}

/// Rides from every stop named like `from` to the end of its run.
///
/// Used to browse where a stop leads. Unlike [`find_connections`], every
/// matching stop of a run yields a ride, not just the first. A stop that
/// ends its run has nowhere to go and is skipped.
pub fn find_connections_only_from(
    from: &str,
    stops: &[Stop],
    now: NaiveDateTime,
    config: &SearchConfig,
) -> Vec<Connection> {
    let mut matcher = NameMatcher::new(from, config.threshold);
    if matcher.is_empty() {
        return Vec::new();
    }

    let mut connections = Vec::new();
    for run in runs(stops) {
        let last = run.len() - 1;
        for (start, stop) in run.iter().enumerate().take(last) {
            if matcher.matches(&stop.name) {
                connections.extend(Connection::over(&run[start..], now));
            }
        }
    }

    connections
}

/// Rides from the start of every run to each later stop named like `to`.
///
/// Used to browse which routes lead to a stop.
pub fn find_connections_only_to(
    to: &str,
    stops: &[Stop],
    now: NaiveDateTime,
    config: &SearchConfig,
) -> Vec<Connection> {
    let mut matcher = NameMatcher::new(to, config.threshold);
    if matcher.is_empty() {
        return Vec::new();
    }

    let mut connections = Vec::new();
    for run in runs(stops) {
        for (end, stop) in run.iter().enumerate().skip(1) {
            if matcher.matches(&stop.name) {
                connections.extend(Connection::over(&run[..=end], now));
            }
        }
    }

    connections
}

/// Order connections by how soon they leave.
///
/// Stable: departing now first, then by minutes, then rides whose schedule
/// is over for today, then rides that do not run today.
pub fn sort_by_departure(mut connections: Vec<Connection>) -> Vec<Connection> {
    connections.sort_by_key(|c| c.info.departure);
    connections
}
