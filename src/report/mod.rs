// Usage reports reconstructed from the cumulative counter series and the job log.

pub mod aggregate;
pub mod baseline;
pub mod daily;
pub mod jobs;
pub mod metadata;

pub use baseline::BaselineRule;
pub use metadata::{MetadataRegistry, ResolvedMetadata};

use tracing::instrument;

use crate::models::{CounterEvent, DailyTotal, JobPrinterReading, ReportQuery, ReportRow, Window};
use crate::store::CounterStore;

/// Default size of the recent-events feed.
pub const DEFAULT_EVENT_LIMIT: usize = 50;

/// Grouped usage over `query.window`, largest difference first.
#[instrument(skip(store), fields(operation = "counter_report"))]
pub async fn counter_report(
    store: &CounterStore,
    query: &ReportQuery,
) -> anyhow::Result<Vec<ReportRow>> {
    let snapshot = store.counter_snapshot(&query.window).await?;
    Ok(aggregate::build_report(&snapshot, query))
}

/// Print + copy pages per calendar day within `window`.
#[instrument(skip(store), fields(operation = "counter_daily"))]
pub async fn counter_daily(store: &CounterStore, window: &Window) -> anyhow::Result<Vec<DailyTotal>> {
    let readings = store.daily_series(window).await?;
    Ok(daily::daily_totals(&readings, window))
}

/// Newest counter movements, at most `limit`.
#[instrument(skip(store), fields(operation = "recent_counter_events"))]
pub async fn recent_counter_events(
    store: &CounterStore,
    limit: usize,
) -> anyhow::Result<Vec<CounterEvent>> {
    store.counter_events(limit).await
}

#[instrument(skip(store), fields(operation = "job_printer_readings"))]
pub async fn job_printer_readings(
    store: &CounterStore,
    window: &Window,
) -> anyhow::Result<Vec<JobPrinterReading>> {
    let snapshot = store.job_snapshot(window).await?;
    Ok(jobs::build_readings(&snapshot))
}
