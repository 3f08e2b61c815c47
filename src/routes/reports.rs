// Report handlers: latest counters, grouped report, daily totals, events, job readings

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::models::{
    CounterEvent, DailyTotal, GroupBy, JobPrinterReading, LatestCounter, Metric, ReportQuery,
    ReportRow, Window,
};
use crate::report::{self, DEFAULT_EVENT_LIMIT};

#[derive(Debug, Default, Deserialize)]
pub(super) struct WindowParams {
    since: Option<String>,
    until: Option<String>,
}

impl WindowParams {
    fn window(&self) -> Result<Window, ApiError> {
        Ok(Window::from_params(
            self.since.as_deref(),
            self.until.as_deref(),
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ReportParams {
    #[serde(flatten)]
    window: WindowParams,
    group_by: Option<String>,
    metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct EventParams {
    limit: Option<usize>,
}

pub(super) async fn latest_counters(
    State(state): State<AppState>,
) -> Result<Json<Vec<LatestCounter>>, ApiError> {
    Ok(Json(state.store.latest_per_printer().await?))
}

/// GET /api/counter-report?since&until&group_by&metric. Unknown group_by/metric fall back
/// to printer/print.
pub(super) async fn counter_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let query = ReportQuery {
        window: params.window.window()?,
        group_by: params.group_by.as_deref().map(GroupBy::parse).unwrap_or_default(),
        metric: params.metric.as_deref().map(Metric::parse).unwrap_or_default(),
    };
    Ok(Json(report::counter_report(&state.store, &query).await?))
}

pub(super) async fn counter_daily(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<DailyTotal>>, ApiError> {
    let window = params.window()?;
    Ok(Json(report::counter_daily(&state.store, &window).await?))
}

pub(super) async fn counter_events(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> Result<Json<Vec<CounterEvent>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Ok(Json(report::recent_counter_events(&state.store, limit).await?))
}

pub(super) async fn job_printer_readings(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<JobPrinterReading>>, ApiError> {
    let window = params.window()?;
    Ok(Json(report::job_printer_readings(&state.store, &window).await?))
}
