//! Timetable storage.
//!
//! A [`Store`] holds the stops of one dataset while it loads; a
//! [`Timetable`] points at the current store and runs queries against it.

mod stops;
mod timetable;

pub use stops::{Store, StoreStatus};
pub use timetable::Timetable;
