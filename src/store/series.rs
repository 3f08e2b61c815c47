// Bounded reads of the counter series for the daily totals and the recent-events feed.

use super::{
    CounterStore, NOT_EXCLUDED, READING_COLUMNS, from_millis, latest_join, parse_reading_row,
    to_millis,
};
use crate::models::{CounterEvent, CounterReading, Window};
use sqlx::Row;
use tracing::instrument;

impl CounterStore {
    /// In-window readings, each printer preceded by its latest reading before `since` so its
    /// first in-window step has a predecessor. Ordered by printer, then time. Excluded printers
    /// are left out.
    #[instrument(skip(self), fields(repo = "counters", operation = "daily_series"))]
    pub async fn daily_series(&self, window: &Window) -> anyhow::Result<Vec<CounterReading>> {
        let mut tx = self.pool.begin().await?;

        let mut readings = match window.since {
            Some(since) => {
                let sql = format!(
                    "SELECT {READING_COLUMNS} {} WHERE {NOT_EXCLUDED}",
                    latest_join("AND c2.timestamp < $1")
                );
                let rows = sqlx::query(&sql)
                    .bind(to_millis(since))
                    .fetch_all(&mut *tx)
                    .await?;
                rows.iter()
                    .map(parse_reading_row)
                    .collect::<anyhow::Result<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        let sql = format!(
            "SELECT {READING_COLUMNS} FROM printer_counters c
             WHERE ($1 IS NULL OR c.timestamp >= $1) AND ($2 IS NULL OR c.timestamp <= $2)
               AND {NOT_EXCLUDED}
             ORDER BY c.printer_name ASC, c.timestamp ASC, c.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(window.since.map(to_millis))
            .bind(window.until.map(to_millis))
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        for row in &rows {
            readings.push(parse_reading_row(row)?);
        }
        // Stable: each printer's seed stays ahead of its in-window rows.
        readings.sort_by(|a, b| a.printer_name.cmp(&b.printer_name));
        Ok(readings)
    }

    /// Readings that moved print or copy forward since the printer's previous reading, newest
    /// first, at most `limit`. Each component is clamped at zero, so a counter reset only hides
    /// the component that went backwards.
    #[instrument(skip(self), fields(repo = "counters", operation = "counter_events"))]
    pub async fn counter_events(&self, limit: usize) -> anyhow::Result<Vec<CounterEvent>> {
        let sql = format!(
            "SELECT printer_name, timestamp, delta_print, delta_copy FROM (
                 SELECT c.id, c.printer_name, c.timestamp,
                        MAX(0, c.total_print - COALESCE(LAG(c.total_print) OVER w, c.total_print)) AS delta_print,
                        MAX(0, c.total_copy - COALESCE(LAG(c.total_copy) OVER w, c.total_copy)) AS delta_copy
                 FROM printer_counters c
                 WHERE {NOT_EXCLUDED}
                 WINDOW w AS (PARTITION BY c.printer_name ORDER BY c.timestamp ASC, c.id ASC)
             )
             WHERE delta_print + delta_copy > 0
             ORDER BY timestamp DESC, printer_name ASC, id ASC
             LIMIT $1"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp: i64 = row.try_get("timestamp")?;
            let delta_print: i64 = row.try_get("delta_print")?;
            let delta_copy: i64 = row.try_get("delta_copy")?;
            let (delta_print, delta_copy) = (delta_print.max(0) as u64, delta_copy.max(0) as u64);
            events.push(CounterEvent {
                timestamp: from_millis(timestamp),
                printer: row.try_get("printer_name")?,
                pages: delta_print + delta_copy,
                delta_print,
                delta_copy,
            });
        }
        Ok(events)
    }
}
