//! Web layer for the timetable server.
//!
//! JSON endpoints for stop search, connections and a stop's timetable,
//! plus status and refresh of the loaded dataset.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
