// JSON HTTP routes over the counter store and poll scheduler

mod http;
mod registry;
mod reports;
mod sources;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::models::WindowError;
use crate::poller::PollScheduler;
use crate::store::CounterStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<CounterStore>,
    pub(crate) scheduler: Arc<PollScheduler>,
}

/// Handler errors, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<WindowError> for ApiError {
    fn from(e: WindowError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(e) => {
                tracing::warn!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("storage error: {e}"))
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn app(store: Arc<CounterStore>, scheduler: Arc<PollScheduler>) -> Router {
    let state = AppState { store, scheduler };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/printer-sources", get(sources::list_sources)) // GET /api/printer-sources
        .route("/api/printer-sources/{id}/test", post(sources::test_source)) // POST /api/printer-sources/{id}/test
        .route("/api/printer-scan", post(sources::scan)) // POST /api/printer-scan
        .route("/api/printer-counters", get(reports::latest_counters)) // GET /api/printer-counters
        .route("/api/counter-report", get(reports::counter_report)) // GET /api/counter-report
        .route("/api/counter-daily", get(reports::counter_daily)) // GET /api/counter-daily
        .route("/api/counter-events", get(reports::counter_events)) // GET /api/counter-events
        .route("/api/job-printer-readings", get(reports::job_printer_readings)) // GET /api/job-printer-readings
        .route("/api/agents", get(registry::list_agents)) // GET /api/agents
        .route("/api/agents/heartbeat", post(registry::heartbeat)) // POST /api/agents/heartbeat
        .route("/api/client-jobs", post(registry::client_jobs)) // POST /api/client-jobs
        .route("/api/printer-models", post(registry::upsert_printer_model)) // POST /api/printer-models
        .route(
            "/api/exclusions",
            get(registry::list_exclusions)
                .post(registry::add_exclusion)
                .delete(registry::remove_exclusion),
        ) // GET/POST/DELETE /api/exclusions
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
