//! Dataset retrieval.
//!
//! The timetable is published as one gzip-compressed JSON file. It is
//! downloaded over HTTP, decompressed, and kept on disk between runs.

mod cache;
mod client;
mod error;

pub use cache::{CachedSource, DatasetCache};
pub use client::{DEFAULT_DATASET_URL, DatasetSource, HttpSource, HttpSourceConfig, decompress};
pub use error::FetchError;
