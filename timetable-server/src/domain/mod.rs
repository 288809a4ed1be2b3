//! Domain types for the timetable server.
//!
//! This module contains the validated timetable rows and the time types the
//! query engine computes with. Records are checked when they are decoded, so
//! code that receives a [`Stop`] can trust its tables are aligned.

mod stop;
mod time;

pub use stop::{
    InvalidStop, Stop, StopDto, Times, TimesDto, minute_values, strip_annotations,
};
pub use time::{Calendar, ClockTime, TimeError};
