//! Application state for the web layer.

use std::sync::Arc;

use crate::fetch::{CachedSource, DatasetSource, HttpSource};
use crate::store::Timetable;

/// Shared application state.
///
/// `S` is where refreshed datasets come from; the server uses the HTTP
/// source behind the disk cache.
pub struct AppState<S = CachedSource<HttpSource>> {
    /// The timetable queries run against
    pub timetable: Timetable,

    /// Source of fresh datasets for refresh requests
    pub source: Arc<S>,
}

impl<S: DatasetSource> AppState<S> {
    /// Create a new app state.
    pub fn new(timetable: Timetable, source: S) -> Self {
        Self {
            timetable,
            source: Arc::new(source),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            timetable: self.timetable.clone(),
            source: self.source.clone(),
        }
    }
}
