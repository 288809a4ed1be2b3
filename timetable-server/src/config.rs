//! Process configuration.
//!
//! Read once at startup from environment variables, falling back to
//! defaults for anything unset.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::fetch::HttpSourceConfig;
use crate::search::SearchConfig;

/// Default listen address.
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::V4(std::net::SocketAddrV4::new(
    std::net::Ipv4Addr::LOCALHOST,
    3000,
));

/// Errors from reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address {value:?}: {source}")]
    Listen {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("cannot locate a data directory: neither XDG_DATA_HOME nor HOME is set")]
    NoDataDir,
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dataset download settings.
    pub http: HttpSourceConfig,
    /// Where the decompressed dataset is cached.
    pub data_path: PathBuf,
    /// Address the web server binds to.
    pub listen: SocketAddr,
    /// Search and loading parameters.
    pub search: SearchConfig,
}

impl AppConfig {
    /// Create a config caching the dataset at `data_path`, with defaults
    /// for everything else.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            http: HttpSourceConfig::default(),
            data_path: data_path.into(),
            listen: DEFAULT_LISTEN,
            search: SearchConfig::default(),
        }
    }

    /// Build the config from the environment.
    ///
    /// - `TIMETABLE_URL`: dataset URL
    /// - `TIMETABLE_DATA_PATH`: dataset cache file
    /// - `TIMETABLE_LISTEN`: listen address
    ///
    /// Without `TIMETABLE_DATA_PATH`, the cache lives under `XDG_DATA_HOME`
    /// or, failing that, in `HOME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_path = match non_empty_var("TIMETABLE_DATA_PATH") {
            Some(path) => PathBuf::from(path),
            None => dataset_path(
                non_empty_var("XDG_DATA_HOME").as_deref().map(Path::new),
                non_empty_var("HOME").as_deref().map(Path::new),
            )
            .ok_or(ConfigError::NoDataDir)?,
        };

        let mut config = Self::new(data_path);

        if let Some(url) = non_empty_var("TIMETABLE_URL") {
            config = config.with_url(url);
        }

        if let Some(listen) = non_empty_var("TIMETABLE_LISTEN") {
            let addr = listen.parse().map_err(|source| ConfigError::Listen {
                value: listen.clone(),
                source,
            })?;
            config = config.with_listen(addr);
        }

        Ok(config)
    }

    /// Set the dataset URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.http.url = url.into();
        self
    }

    /// Set the listen address.
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Set the search parameters.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new("schedule.json")
    }
}

/// Default dataset cache location.
///
/// `$XDG_DATA_HOME/scheduler/schedule.json` when the XDG directory is known,
/// otherwise `$HOME/.schedule.json`.
pub fn dataset_path(xdg_data_home: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    match (xdg_data_home, home) {
        (Some(xdg), _) => Some(xdg.join("scheduler").join("schedule.json")),
        (None, Some(home)) => Some(home.join(".schedule.json")),
        (None, None) => None,
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
