// Printer source handlers: list, on-demand scan, single-source test

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::models::PrinterSource;
use crate::poller::PollOutcome;

#[derive(Debug, Serialize)]
pub(super) struct ScanResponse {
    ok: bool,
    results: Vec<PollOutcome>,
}

pub(super) async fn list_sources(
    State(state): State<AppState>,
) -> Result<Json<Vec<PrinterSource>>, ApiError> {
    Ok(Json(state.store.list_sources().await?))
}

/// POST /api/printer-scan - polls every enabled source now.
pub(super) async fn scan(State(state): State<AppState>) -> Result<Json<ScanResponse>, ApiError> {
    let results = state.scheduler.scan_all().await?;
    Ok(Json(ScanResponse { ok: true, results }))
}

/// POST /api/printer-sources/{id}/test - polls one source (enabled or not) and records the result.
pub(super) async fn test_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PollOutcome>, ApiError> {
    let source = state
        .store
        .get_source(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("printer source {id} not found")))?;
    Ok(Json(state.scheduler.poll_source(&source).await))
}
