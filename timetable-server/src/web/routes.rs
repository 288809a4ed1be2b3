//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Local, NaiveDateTime};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::departure::{Departure, mins_to_next_bus, next_departure};
use crate::domain::{Calendar, ClockTime};
use crate::fetch::{DatasetSource, FetchError};
use crate::loader::{LoadError, join_load};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: DatasetSource + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status::<S>))
        .route("/api/stops", get(search_stops::<S>))
        .route("/api/stops/:id/times", get(stop_times::<S>))
        .route("/api/connections", get(connections::<S>))
        .route("/api/connections/from", get(connections_from::<S>))
        .route("/api/connections/to", get(connections_to::<S>))
        .route("/api/refresh", post(refresh::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Resolve the query time: today at `at` if given, otherwise now.
fn query_time(at: Option<&str>) -> Result<NaiveDateTime, AppError> {
    let now = Local::now().naive_local();
    match at.filter(|s| !s.is_empty()) {
        Some(at) => {
            let time = ClockTime::parse_hhmm(at).map_err(|e| AppError::BadRequest {
                message: format!("Invalid time {:?}: {}", at, e),
            })?;
            Ok(time.on(now.date()))
        }
        None => Ok(now),
    }
}

/// Loading progress of the current timetable.
async fn status<S>(State(state): State<AppState<S>>) -> Json<StatusResponse> {
    let store = state.timetable.store().await;
    Json(StatusResponse::new(store.status().await, store.error().await))
}

/// Search stops by name or line number.
async fn search_stops<S>(
    State(state): State<AppState<S>>,
    Query(req): Query<TextQuery>,
) -> Result<Json<StopsResponse>, AppError> {
    let now = query_time(req.at.as_deref())?;
    let stops = state.timetable.find_stops(&req.q).await;

    let stops = stops
        .iter()
        .map(|stop| StopResult::new(stop, mins_to_next_bus(stop, now)))
        .collect();

    Ok(Json(StopsResponse { stops }))
}

/// The timetable of one stop for today's calendar.
async fn stop_times<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
    Query(req): Query<AtQuery>,
) -> Result<Json<StopTimesResponse>, AppError> {
    let now = query_time(req.at.as_deref())?;
    let stop = state
        .timetable
        .stop(id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("No stop with id {}", id),
        })?;

    let departure = mins_to_next_bus(&stop, now);
    let next = match departure {
        Departure::In(_) => next_departure(&stop, now).ok(),
        _ => None,
    };

    Ok(Json(StopTimesResponse::new(
        &stop,
        Calendar::for_date(now.date()),
        next,
        departure,
    )))
}

/// Connections between two named stops, soonest first.
async fn connections<S>(
    State(state): State<AppState<S>>,
    Query(req): Query<ConnectionQuery>,
) -> Result<Json<ConnectionsResponse>, AppError> {
    let now = query_time(req.at.as_deref())?;
    let found = state
        .timetable
        .find_connections(&req.from, &req.to, now)
        .await;
    Ok(Json(ConnectionsResponse::new(found)))
}

/// Where rides from a named stop lead, soonest first.
async fn connections_from<S>(
    State(state): State<AppState<S>>,
    Query(req): Query<TextQuery>,
) -> Result<Json<ConnectionsResponse>, AppError> {
    let now = query_time(req.at.as_deref())?;
    let found = state
        .timetable
        .find_connections_only_from(&req.q, now)
        .await;
    Ok(Json(ConnectionsResponse::new(found)))
}

/// Which rides reach a named stop, soonest first.
async fn connections_to<S>(
    State(state): State<AppState<S>>,
    Query(req): Query<TextQuery>,
) -> Result<Json<ConnectionsResponse>, AppError> {
    let now = query_time(req.at.as_deref())?;
    let found = state.timetable.find_connections_only_to(&req.q, now).await;
    Ok(Json(ConnectionsResponse::new(found)))
}

/// Download a fresh dataset and start loading it.
///
/// Responds as soon as the replacement timetable is in place; its stops
/// keep arriving after the response.
async fn refresh<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, AppError>
where
    S: DatasetSource + 'static,
{
    let handle = state.timetable.refresh(state.source.as_ref()).await?;

    tokio::spawn(async move {
        // Decode failures are logged by the loader itself
        if let Err(LoadError::Task(message)) = join_load(handle).await {
            error!(%message, "timetable load task failed");
        }
    });

    let store = state.timetable.store().await;
    let body = StatusResponse::new(store.status().await, store.error().await);
    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        } else {
            info!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchConfig;
    use crate::store::Timetable;
    use chrono::Timelike;

    /// Every calendar carries the same table, so results do not depend on
    /// the day the tests run.
    const DATASET: &str = r#"[
        {"id": 1, "line": 4, "direction": "Out", "stop_name": "Main St",
         "times": {"hour": ["8", "9"], "work": ["30", "30"], "saturday": ["30", "30"], "holiday": ["30", "30"]}},
        {"id": 2, "line": 4, "direction": "Out", "stop_name": "Elm St",
         "times": {"hour": ["8", "9"], "work": ["42", "42"], "saturday": ["42", "42"], "holiday": ["42", "42"]}},
        {"id": 3, "line": 9, "direction": "Out", "stop_name": "Main St",
         "times": {"hour": ["8"], "work": ["21"], "saturday": ["21"], "holiday": ["21"]}},
        {"id": 4, "line": 9, "direction": "Out", "stop_name": "Elm St",
         "times": {"hour": ["8"], "work": ["29"], "saturday": ["29"], "holiday": ["29"]}}
    ]"#;

    struct FixedSource(&'static str);

    impl DatasetSource for FixedSource {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct DownSource;

    impl DatasetSource for DownSource {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Api {
                status: 500,
                message: "down".into(),
            })
        }
    }

    async fn state_with<S: DatasetSource>(source: S) -> AppState<S> {
        let timetable = Timetable::new(SearchConfig::default());
        let handle = timetable.load_bytes(DATASET.as_bytes().to_vec()).await;
        join_load(handle).await.unwrap();
        AppState::new(timetable, source)
    }

    fn text(q: &str, at: &str) -> Query<TextQuery> {
        Query(TextQuery {
            q: q.into(),
            at: Some(at.into()),
        })
    }

    #[test]
    fn query_time_override() {
        let at = query_time(Some("07:45")).unwrap();
        assert_eq!((at.hour(), at.minute()), (7, 45));
    }

    #[test]
    fn query_time_rejects_garbage() {
        assert!(matches!(
            query_time(Some("7.45")),
            Err(AppError::BadRequest { .. })
        ));
        assert!(query_time(Some("")).is_ok());
        assert!(query_time(None).is_ok());
    }

    #[test]
    fn error_status_codes() {
        let cases = [
            (AppError::BadRequest { message: "x".into() }, StatusCode::BAD_REQUEST),
            (AppError::NotFound { message: "x".into() }, StatusCode::NOT_FOUND),
            (AppError::Upstream { message: "x".into() }, StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn health_check() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn status_reports_loaded_timetable() {
        let state = state_with(FixedSource("[]")).await;
        let Json(body) = status(State(state)).await;
        assert_eq!(body.stops, 4);
        assert!(body.complete);
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn stop_search_with_departures() {
        let state = state_with(FixedSource("[]")).await;
        let Json(body) = search_stops(State(state), text("main", "08:25")).await.unwrap();

        let found: Vec<(u64, &str)> = body
            .stops
            .iter()
            .map(|s| (s.id, s.description.as_str()))
            .collect();
        assert_eq!(found, vec![(1, "In 5 min"), (3, "Beyond schedule")]);
    }

    #[tokio::test]
    async fn stop_search_bad_time() {
        let state = state_with(FixedSource("[]")).await;
        let result = search_stops(State(state), text("main", "25:00")).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn connections_soonest_first() {
        let state = state_with(FixedSource("[]")).await;
        let query = Query(ConnectionQuery {
            from: "Main St".into(),
            to: "Elm St".into(),
            at: Some("08:20".into()),
        });
        let Json(body) = connections(State(state), query).await.unwrap();

        let lines: Vec<u32> = body.connections.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![9, 4]);
        assert_eq!(body.connections[0].ride_mins, Some(8));
        assert_eq!(body.connections[1].description, "In 10 min [12 min ride]");
    }

    #[tokio::test]
    async fn one_sided_connections() {
        let state = state_with(FixedSource("[]")).await;

        let Json(from) = connections_from(State(state.clone()), text("Main St", "08:00"))
            .await
            .unwrap();
        assert_eq!(from.connections.len(), 2);

        let Json(to) = connections_to(State(state), text("Elm St", "08:25"))
            .await
            .unwrap();
        assert_eq!(to.connections[0].line, 4);
        assert_eq!(to.connections[1].departure, Departure::BeyondSchedule);
    }

    #[tokio::test]
    async fn stop_timetable() {
        let state = state_with(FixedSource("[]")).await;
        let Json(body) = stop_times(
            State(state),
            Path(1),
            Query(AtQuery {
                at: Some("08:45".into()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.name, "Main St");
        assert_eq!(body.hours.len(), 2);
        assert_eq!(body.hours[1].hour, "09");
        let next = body.next.unwrap();
        assert_eq!((next.hour_index, next.minute_index), (1, 0));
        assert_eq!(body.description, "In 45 min");
    }

    #[tokio::test]
    async fn stop_timetable_after_last_departure() {
        let state = state_with(FixedSource("[]")).await;
        let Json(body) = stop_times(
            State(state),
            Path(3),
            Query(AtQuery {
                at: Some("22:00".into()),
            }),
        )
        .await
        .unwrap();

        assert!(body.next.is_none());
        assert_eq!(body.departure, Departure::BeyondSchedule);
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let state = state_with(FixedSource("[]")).await;
        let result = stop_times(State(state), Path(99), Query(AtQuery::default())).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn refresh_replaces_timetable() {
        let state = state_with(FixedSource("[]")).await;
        let response = refresh(State(state.clone())).await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let status = state.timetable.wait_until_complete().await;
        assert!(status.complete);
        assert_eq!(status.len, 0);
    }

    #[tokio::test]
    async fn refresh_upstream_failure() {
        let state = state_with(DownSource).await;
        let result = refresh(State(state.clone())).await;
        assert!(matches!(result, Err(AppError::Upstream { .. })));
        assert_eq!(state.timetable.status().await.len, 4);
    }
}
