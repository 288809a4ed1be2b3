//! Stop and connection search.
//!
//! Resolves what the user typed into stops, or into rides between two
//! stops on the same line. Text matching goes through [`crate::fuzzy`];
//! departure descriptions come from [`crate::departure`].

mod config;
mod connections;
mod stops;

pub use config::SearchConfig;
pub use connections::{
    Connection, find_connections, find_connections_only_from, find_connections_only_to, runs,
    sort_by_departure,
};
pub use stops::{NameMatcher, find_stops};
