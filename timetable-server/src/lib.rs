//! Commuter timetable query server.
//!
//! Loads a city's published stop timetables, incrementally so the first
//! stops can be searched while the rest is still decoding, and answers:
//! "which stop is this?", "how do I get from here to there without
//! changing?" and "how long until the next one leaves?".

pub mod config;
pub mod departure;
pub mod domain;
pub mod fetch;
pub mod fuzzy;
pub mod loader;
pub mod schedule;
pub mod search;
pub mod store;
pub mod web;
