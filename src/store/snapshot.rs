// Consistent read sets for reports. Every query of one snapshot runs inside a single
// transaction, so concurrent poll inserts never split a report.

use std::collections::HashMap;

use sqlx::Row;
use tracing::instrument;

use super::registry::{AGENT_COLUMNS, SOURCE_COLUMNS, parse_agent_row, parse_source_row};
use super::{CounterStore, NOT_EXCLUDED, READING_COLUMNS, latest_join, parse_reading_row, to_millis};
use crate::models::{ClientAgent, CounterReading, PrinterSource, Window};

/// Everything the counter report needs, read at one point in time.
#[derive(Debug, Default)]
pub struct CounterSnapshot {
    /// In-window readings of non-excluded printers, ordered by printer, then time.
    pub readings: Vec<CounterReading>,
    /// Latest reading per printer in `[since - 1 day, since)`.
    pub previous_day: HashMap<String, CounterReading>,
    /// Latest reading per printer strictly before `since`.
    pub earlier: HashMap<String, CounterReading>,
    pub sources: Vec<PrinterSource>,
    /// Most recently updated first.
    pub agents: Vec<ClientAgent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTotal {
    pub printer: String,
    /// Pages of jobs before `since`.
    pub initial: u64,
    /// Pages of jobs up to `until`.
    pub last: u64,
}

#[derive(Debug, Default)]
pub struct JobSnapshot {
    /// Printers with a non-zero total, by name.
    pub totals: Vec<JobTotal>,
    pub sources: Vec<PrinterSource>,
    pub agents: Vec<ClientAgent>,
    /// printer_models overrides, printer -> model.
    pub models: HashMap<String, String>,
}

impl CounterStore {
    #[instrument(skip(self), fields(repo = "counters", operation = "counter_snapshot"))]
    pub async fn counter_snapshot(&self, window: &Window) -> anyhow::Result<CounterSnapshot> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {READING_COLUMNS} FROM printer_counters c
             WHERE ($1 IS NULL OR c.timestamp >= $1)
               AND ($2 IS NULL OR c.timestamp <= $2)
               AND {NOT_EXCLUDED}
             ORDER BY c.printer_name ASC, c.timestamp ASC, c.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(window.since.map(to_millis))
            .bind(window.until.map(to_millis))
            .fetch_all(&mut *tx)
            .await?;
        let readings = rows
            .iter()
            .map(parse_reading_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut previous_day = HashMap::new();
        let mut earlier = HashMap::new();
        if let Some(since) = window.since {
            let since = to_millis(since);

            if let Some(start) = window.previous_day_start() {
                let sql = format!(
                    "SELECT {READING_COLUMNS} {} WHERE {NOT_EXCLUDED}",
                    latest_join("AND c2.timestamp >= $1 AND c2.timestamp < $2")
                );
                let rows = sqlx::query(&sql)
                    .bind(to_millis(start))
                    .bind(since)
                    .fetch_all(&mut *tx)
                    .await?;
                for row in &rows {
                    let r = parse_reading_row(row)?;
                    previous_day.insert(r.printer_name.clone(), r);
                }
            }

            let sql = format!(
                "SELECT {READING_COLUMNS} {} WHERE {NOT_EXCLUDED}",
                latest_join("AND c2.timestamp < $1")
            );
            let rows = sqlx::query(&sql).bind(since).fetch_all(&mut *tx).await?;
            for row in &rows {
                let r = parse_reading_row(row)?;
                earlier.insert(r.printer_name.clone(), r);
            }
        }

        let sources = fetch_sources(&mut tx).await?;
        let agents = fetch_agents(&mut tx).await?;
        tx.commit().await?;

        Ok(CounterSnapshot {
            readings,
            previous_day,
            earlier,
            sources,
            agents,
        })
    }

    #[instrument(skip(self), fields(repo = "jobs", operation = "job_snapshot"))]
    pub async fn job_snapshot(&self, window: &Window) -> anyhow::Result<JobSnapshot> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT j.printer AS printer,
                   COALESCE(SUM(CASE WHEN $1 IS NOT NULL AND j.timestamp < $1
                                     THEN j.pages * j.copies ELSE 0 END), 0) AS initial,
                   COALESCE(SUM(j.pages * j.copies), 0) AS last
            FROM jobs j
            WHERE ($2 IS NULL OR j.timestamp <= $2)
              AND TRIM(j.printer) <> ''
              AND j.printer NOT IN (SELECT printer FROM report_exclusions)
            GROUP BY j.printer
            HAVING COALESCE(SUM(j.pages * j.copies), 0) > 0
            ORDER BY j.printer ASC
            "#,
        )
        .bind(window.since.map(to_millis))
        .bind(window.until.map(to_millis))
        .fetch_all(&mut *tx)
        .await?;

        let mut totals = Vec::with_capacity(rows.len());
        for row in &rows {
            let initial: i64 = row.try_get("initial")?;
            let last: i64 = row.try_get("last")?;
            totals.push(JobTotal {
                printer: row.try_get("printer")?,
                initial: initial.max(0) as u64,
                last: last.max(0) as u64,
            });
        }

        let sources = fetch_sources(&mut tx).await?;
        let agents = fetch_agents(&mut tx).await?;
        let models = sqlx::query_as::<_, (String, String)>("SELECT printer, model FROM printer_models")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();
        tx.commit().await?;

        Ok(JobSnapshot {
            totals,
            sources,
            agents,
            models,
        })
    }
}

async fn fetch_sources(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
) -> anyhow::Result<Vec<PrinterSource>> {
    let sql = format!("SELECT {SOURCE_COLUMNS} FROM printer_sources ORDER BY name ASC");
    let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;
    rows.iter().map(parse_source_row).collect()
}

async fn fetch_agents(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
) -> anyhow::Result<Vec<ClientAgent>> {
    let sql = format!("SELECT {AGENT_COLUMNS} FROM client_agents ORDER BY updated_at DESC");
    let rows = sqlx::query(&sql).fetch_all(&mut **tx).await?;
    rows.iter().map(parse_agent_row).collect()
}
