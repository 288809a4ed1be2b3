//! The shared stop store.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::Stop;
use crate::schedule::normalize_all;

/// Point-in-time view of a store's loading progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Stops decoded so far.
    pub len: usize,
    /// Every stop is decoded and normalized.
    pub complete: bool,
    /// The load was aborted; `complete` will never become true.
    pub failed: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    stops: Vec<Stop>,
    complete: bool,
    error: Option<String>,
}

/// Stops of one dataset, filled in while the dataset is decoded.
///
/// The loader appends stops one at a time and then completes the store,
/// which normalizes every stop's tables in the same critical section. All
/// readers go through the lock, so a reader sees either a prefix of the
/// dataset as it was decoded or the finished, normalized dataset.
///
/// Writers use the blocking lock methods and must run outside the async
/// runtime (the loader runs on the blocking pool).
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<StoreState>,
}

impl Store {
    /// Create an empty, incomplete store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded stop.
    ///
    /// Stops arriving after completion are dropped.
    pub(crate) fn append_blocking(&self, stop: Stop) {
        let mut state = self.state.blocking_write();
        if state.complete || state.error.is_some() {
            tracing::warn!(id = stop.id, "dropping stop appended to a finished store");
            return;
        }
        state.stops.push(stop);
    }

    /// Normalize all stops and mark the store complete.
    ///
    /// Returns `false` if the store was already complete or had failed.
    pub(crate) fn complete_blocking(&self) -> bool {
        let mut state = self.state.blocking_write();
        if state.complete || state.error.is_some() {
            return false;
        }
        normalize_all(&mut state.stops);
        state.complete = true;
        true
    }

    /// Record that the load was aborted.
    ///
    /// Stops decoded before the failure are discarded; a failed store
    /// answers every query with nothing.
    pub(crate) fn fail_blocking(&self, message: String) {
        let mut state = self.state.blocking_write();
        if !state.complete {
            state.stops = Vec::new();
            state.error = Some(message);
        }
    }

    /// Current loading progress.
    pub async fn status(&self) -> StoreStatus {
        let state = self.state.read().await;
        StoreStatus {
            len: state.stops.len(),
            complete: state.complete,
            failed: state.error.is_some(),
        }
    }

    /// Why the load was aborted, if it was.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Run `f` over the stops decoded so far.
    ///
    /// The read lock is held for the duration of `f`, so the loader waits
    /// until it returns.
    pub async fn with_stops<R>(&self, f: impl FnOnce(&[Stop]) -> R) -> R {
        let state = self.state.read().await;
        f(&state.stops)
    }

    /// Look up a stop by id.
    pub async fn stop(&self, id: u64) -> Option<Stop> {
        self.with_stops(|stops| stops.iter().find(|s| s.id == id).cloned())
            .await
    }

    /// Poll until at least `min_len` stops are available, or loading ends.
    pub async fn wait_for_len(&self, min_len: usize, interval: Duration) -> StoreStatus {
        self.wait_until(interval, |status| status.len >= min_len).await
    }

    /// Poll until the store is complete or the load has failed.
    pub async fn wait_until_complete(&self, interval: Duration) -> StoreStatus {
        self.wait_until(interval, |_| false).await
    }

    async fn wait_until(
        &self,
        interval: Duration,
        done: impl Fn(&StoreStatus) -> bool,
    ) -> StoreStatus {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let status = self.status().await;
            if status.complete || status.failed || done(&status) {
                return status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Times;

    fn stop(id: u64, hours: &[u32]) -> Stop {
        Stop {
            id,
            line: 1,
            direction: "A".to_string(),
            name: format!("Stop {id}"),
            times: Times {
                hours: hours.to_vec(),
                work: hours.iter().map(|h| h.to_string()).collect(),
                ..Times::default()
            },
        }
    }

    #[test]
    fn complete_normalizes_once() {
        let store = Store::new();
        store.append_blocking(stop(1, &[23, 0]));
        store.append_blocking(stop(2, &[5, 6]));

        assert!(store.complete_blocking());
        assert!(!store.complete_blocking());

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let hours = rt.block_on(store.with_stops(|stops| {
            stops
                .iter()
                .map(|s| s.times.hours.clone())
                .collect::<Vec<_>>()
        }));
        assert_eq!(hours, vec![vec![0, 23], vec![5, 6]]);
    }

    #[test]
    fn append_after_complete_is_dropped() {
        let store = Store::new();
        store.append_blocking(stop(1, &[5]));
        store.complete_blocking();
        store.append_blocking(stop(2, &[5]));

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let status = rt.block_on(store.status());
        assert_eq!(status.len, 1);
        assert!(status.complete);
    }

    #[test]
    fn failed_store_never_completes() {
        let store = Store::new();
        store.append_blocking(stop(1, &[5]));
        store.fail_blocking("bad input".to_string());

        assert!(!store.complete_blocking());

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let status = rt.block_on(store.status());
        assert!(status.failed);
        assert!(!status.complete);
        assert_eq!(rt.block_on(store.error()).as_deref(), Some("bad input"));
    }

    #[test]
    fn failure_discards_decoded_stops() {
        let store = Store::new();
        store.append_blocking(stop(1, &[5]));
        store.append_blocking(stop(2, &[6]));

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(rt.block_on(store.status()).len, 2);
        assert!(rt.block_on(store.stop(1)).is_some());

        store.fail_blocking("truncated".to_string());
        store.append_blocking(stop(3, &[7]));

        assert_eq!(rt.block_on(store.status()).len, 0);
        assert!(rt.block_on(store.stop(1)).is_none());
        assert!(rt.block_on(store.with_stops(|stops| stops.is_empty())));
    }

    #[tokio::test]
    async fn empty_store_status() {
        let store = Store::new();
        assert_eq!(
            store.status().await,
            StoreStatus {
                len: 0,
                complete: false,
                failed: false,
            }
        );
        assert!(store.stop(1).await.is_none());
    }

    #[tokio::test]
    async fn wait_returns_on_failure() {
        let store = std::sync::Arc::new(Store::new());
        let writer = store.clone();
        tokio::task::spawn_blocking(move || writer.fail_blocking("boom".to_string()))
            .await
            .unwrap();

        let status = store
            .wait_until_complete(Duration::from_millis(1))
            .await;
        assert!(status.failed);
    }
}
