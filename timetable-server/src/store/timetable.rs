//! The current timetable and its query surface.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::Stop;
use crate::fetch::{DatasetSource, FetchError};
use crate::loader::{LoadError, join_load, spawn_load};
use crate::search::{self, Connection, SearchConfig};

use super::stops::{Store, StoreStatus};

/// Thread-safe handle to the current timetable.
///
/// Holds the [`Store`] that queries run against. A refresh swaps in a new
/// store; readers that already hold the previous one keep using it until
/// they drop it.
#[derive(Clone)]
pub struct Timetable {
    current: Arc<RwLock<Arc<Store>>>,
    config: Arc<SearchConfig>,
}

impl Timetable {
    /// Create a handle over an empty store.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Store::new()))),
            config: Arc::new(config),
        }
    }

    /// Search configuration in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The current store.
    pub async fn store(&self) -> Arc<Store> {
        self.current.read().await.clone()
    }

    /// Swap in a fresh, empty store and return it.
    pub async fn replace(&self) -> Arc<Store> {
        let store = Arc::new(Store::new());
        *self.current.write().await = store.clone();
        store
    }

    /// Replace the current store with one loaded from `bytes`.
    ///
    /// The new store is current as soon as this returns; its stops appear
    /// while the returned task decodes them. If decoding fails and the
    /// store it replaced was complete, that store is put back. Either way
    /// nothing from the failed dataset stays visible.
    pub async fn load_bytes(&self, bytes: Vec<u8>) -> JoinHandle<Result<usize, LoadError>> {
        let previous = self.store().await;
        let store = self.replace().await;
        let load = spawn_load(store.clone(), bytes);

        let current = self.current.clone();
        tokio::spawn(async move {
            let result = join_load(load).await;
            if result.is_err() && previous.status().await.complete {
                let mut current = current.write().await;
                // A later load may already have taken over
                if Arc::ptr_eq(&current, &store) {
                    *current = previous;
                    warn!("timetable load failed, keeping the previous timetable");
                }
            }
            result
        })
    }

    /// Fetch a new dataset from `source` and start loading it.
    ///
    /// On a fetch failure the current store is kept.
    pub async fn refresh<S: DatasetSource>(
        &self,
        source: &S,
    ) -> Result<JoinHandle<Result<usize, LoadError>>, FetchError> {
        let bytes = source.fetch().await?;
        info!(bytes = bytes.len(), "refreshing timetable");
        Ok(self.load_bytes(bytes).await)
    }

    /// Loading progress of the current store.
    pub async fn status(&self) -> StoreStatus {
        self.store().await.status().await
    }

    /// Wait until the current store holds `min_len` stops or stops loading.
    pub async fn wait_for_len(&self, min_len: usize) -> StoreStatus {
        self.store()
            .await
            .wait_for_len(min_len, self.config.poll_interval())
            .await
    }

    /// Wait until the current store finishes loading, one way or the other.
    pub async fn wait_until_complete(&self) -> StoreStatus {
        self.store()
            .await
            .wait_until_complete(self.config.poll_interval())
            .await
    }

    /// Look up a stop by id.
    pub async fn stop(&self, id: u64) -> Option<Stop> {
        self.store().await.stop(id).await
    }

    /// Stops matching a free-text query.
    pub async fn find_stops(&self, query: &str) -> Vec<Stop> {
        let config = &self.config;
        self.store()
            .await
            .with_stops(|stops| search::find_stops(stops, query, config))
            .await
    }

    /// Connections between stops named like `from` and `to`, soonest first.
    pub async fn find_connections(&self, from: &str, to: &str, now: NaiveDateTime) -> Vec<Connection> {
        let config = &self.config;
        let found = self
            .store()
            .await
            .with_stops(|stops| search::find_connections(from, to, stops, now, config))
            .await;
        search::sort_by_departure(found)
    }

    /// Rides leaving stops named like `from`, soonest first.
    pub async fn find_connections_only_from(&self, from: &str, now: NaiveDateTime) -> Vec<Connection> {
        let config = &self.config;
        let found = self
            .store()
            .await
            .with_stops(|stops| search::find_connections_only_from(from, stops, now, config))
            .await;
        search::sort_by_departure(found)
    }

    /// Rides arriving at stops named like `to`, soonest first.
    pub async fn find_connections_only_to(&self, to: &str, now: NaiveDateTime) -> Vec<Connection> {
        let config = &self.config;
        let found = self
            .store()
            .await
            .with_stops(|stops| search::find_connections_only_to(to, stops, now, config))
            .await;
        search::sort_by_departure(found)
    }
}
