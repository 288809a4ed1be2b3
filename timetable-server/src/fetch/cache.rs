//! Disk-based cache for the dataset.
//!
//! The decompressed dataset is kept on disk so that startup does not need
//! the network. An explicit refresh always downloads and rewrites it.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::client::DatasetSource;
use super::error::FetchError;

/// Disk cache holding the decompressed dataset.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    path: PathBuf,
}

impl DatasetCache {
    /// Create a cache backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the cached dataset.
    ///
    /// Returns `None` if the cache file doesn't exist or can't be read.
    pub fn load(&self) -> Option<Vec<u8>> {
        std::fs::read(&self.path).ok()
    }

    /// Write the dataset to the cache.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, bytes: &[u8]) -> Result<(), FetchError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        std::fs::write(&self.path, bytes).map_err(|e| FetchError::Cache {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A remote source backed by the disk cache.
///
/// [`CachedSource::fetch_initial`] prefers the cache; [`DatasetSource::fetch`]
/// always goes to the remote and updates the cache.
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    remote: S,
    cache: DatasetCache,
}

impl<S: DatasetSource> CachedSource<S> {
    /// Wrap `remote` with a disk cache.
    pub fn new(remote: S, cache: DatasetCache) -> Self {
        Self { remote, cache }
    }

    /// The dataset for startup: the cached copy if present, else a download.
    pub async fn fetch_initial(&self) -> Result<Vec<u8>, FetchError> {
        if let Some(bytes) = self.cache.load() {
            info!(path = %self.cache.path().display(), "using cached timetable");
            return Ok(bytes);
        }

        info!("no cached timetable, fetching it from the web");
        self.fetch().await
    }
}

impl<S: DatasetSource> DatasetSource for CachedSource<S> {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let bytes = self.remote.fetch().await?;
        if let Err(e) = self.cache.save(&bytes) {
            warn!(error = %e, "failed to cache timetable");
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingSource {
        body: &'static [u8],
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(body: &'static [u8]) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DatasetSource for CountingSource {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.to_vec())
        }
    }

    #[test]
    fn save_and_load_cache() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("schedule.json"));

        cache.save(b"[]").unwrap();
        assert_eq!(cache.load().unwrap(), b"[]");
    }

    #[test]
    fn missing_cache_returns_none() {
        let cache = DatasetCache::new("/nonexistent/path/schedule.json");
        assert!(cache.load().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheduler").join("schedule.json");
        let cache = DatasetCache::new(&path);

        cache.save(b"[]").unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn initial_fetch_downloads_once() {
        let dir = tempdir().unwrap();
        let source = CachedSource::new(
            CountingSource::new(b"[1]"),
            DatasetCache::new(dir.path().join("schedule.json")),
        );

        assert_eq!(source.fetch_initial().await.unwrap(), b"[1]");
        assert_eq!(source.fetch_initial().await.unwrap(), b"[1]");
        assert_eq!(source.remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_always_downloads() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("schedule.json"));
        cache.save(b"[old]").unwrap();

        let source = CachedSource::new(CountingSource::new(b"[new]"), cache.clone());
        assert_eq!(source.fetch_initial().await.unwrap(), b"[old]");
        assert_eq!(source.fetch().await.unwrap(), b"[new]");
        assert_eq!(cache.load().unwrap(), b"[new]");
        assert_eq!(source.remote.calls.load(Ordering::SeqCst), 1);
    }
}
