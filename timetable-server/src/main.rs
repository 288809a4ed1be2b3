use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use timetable_server::config::AppConfig;
use timetable_server::fetch::{CachedSource, DatasetCache, HttpSource};
use timetable_server::loader::join_load;
use timetable_server::store::Timetable;
use timetable_server::web::{AppState, create_router};

/// How often loading progress is logged.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Dataset source: disk cache in front of the published file
    let http = HttpSource::new(config.http.clone()).expect("Failed to create HTTP client");
    let source = CachedSource::new(http, DatasetCache::new(&config.data_path));

    // Load whatever is available, fail fast if there is nothing
    let bytes = source
        .fetch_initial()
        .await
        .expect("Failed to obtain timetable");

    let timetable = Timetable::new(config.search.clone());
    let handle = timetable.load_bytes(bytes).await;

    // Log progress until the dataset is in
    let progress = timetable.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let status = progress.status().await;
            if status.complete || status.failed {
                break;
            }
            info!(stops = status.len, "loading timetable");
        }
    });

    tokio::spawn(async move {
        if let Err(e) = join_load(handle).await {
            error!(error = %e, "initial timetable load failed; POST /api/refresh to retry");
        }
    });

    // Serve once the first batch is searchable
    let status = timetable.wait_for_len(config.search.initial_batch).await;
    if status.failed {
        warn!("serving without a timetable");
    } else {
        info!(stops = status.len, complete = status.complete, "first stops ready");
    }

    let state = AppState::new(timetable, source);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.listen, "timetable server listening");
    info!("  GET  /api/stops?q=             - Search stops");
    info!("  GET  /api/connections?from=&to= - Connections between stops");
    info!("  GET  /api/stops/:id/times      - Timetable of a stop");
    info!("  POST /api/refresh              - Download a fresh dataset");

    axum::serve(listener, app).await.expect("Server error");
}
