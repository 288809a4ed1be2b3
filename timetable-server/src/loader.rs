//! Incremental dataset loading.
//!
//! The dataset is one large JSON array. Rather than decoding it in one go,
//! the loader walks the array element by element and appends each stop to
//! the shared [`Store`] as soon as it is decoded, so searches can run on a
//! growing prefix of the data while the rest is still being read.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use serde::de::{self, DeserializeSeed, SeqAccess, Visitor};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::{Stop, StopDto};
use crate::store::Store;

/// Errors that abort a load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input is not a valid dataset. Nothing from it is accepted.
    #[error("corrupt dataset: {message}")]
    CorruptDataset { message: String },

    /// Reading the input failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// The loading task panicked or was cancelled.
    #[error("load task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            LoadError::Io(e.into())
        } else {
            LoadError::CorruptDataset {
                message: e.to_string(),
            }
        }
    }
}

/// Appends every element of a JSON array to a store as it is decoded.
struct StopSink<'s> {
    store: &'s Store,
}

impl<'de> DeserializeSeed<'de> for StopSink<'_> {
    type Value = usize;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for StopSink<'_> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of stops")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(dto) = seq.next_element::<StopDto>()? {
            let stop = Stop::try_from(dto).map_err(de::Error::custom)?;
            self.store.append_blocking(stop);
            count += 1;
        }
        Ok(count)
    }
}

/// Decode a dataset from `reader` into `store`.
///
/// Stops become visible one by one. Once the closing bracket is read and
/// only whitespace follows, the store is normalized and marked complete.
/// On any error the store is marked failed and never completes.
///
/// This blocks on the store lock; call it from a blocking context such as
/// [`spawn_load`] or a plain thread.
pub fn load<R: Read>(reader: R, store: &Store) -> Result<usize, LoadError> {
    let result = decode(reader, store);
    match &result {
        Ok(count) => {
            store.complete_blocking();
            info!(stops = count, "timetable loaded");
        }
        Err(e) => {
            error!(error = %e, "timetable load aborted");
            store.fail_blocking(e.to_string());
        }
    }
    result
}

fn decode<R: Read>(reader: R, store: &Store) -> Result<usize, LoadError> {
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let count = StopSink { store }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(count)
}

/// Load `bytes` into `store` on the blocking thread pool.
pub fn spawn_load(store: Arc<Store>, bytes: Vec<u8>) -> JoinHandle<Result<usize, LoadError>> {
    debug!(bytes = bytes.len(), "starting timetable load");
    tokio::task::spawn_blocking(move || load(bytes.as_slice(), &store))
}

/// Flatten the result of a spawned load.
pub async fn join_load(handle: JoinHandle<Result<usize, LoadError>>) -> Result<usize, LoadError> {
    handle.await.map_err(|e| LoadError::Task(e.to_string()))?
}
