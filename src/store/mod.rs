// SQLite counter store. printer_counters is append-only: rows are inserted, never updated
// or deleted. Timestamps are local wall-clock times stored as integer milliseconds.

mod registry;
mod series;
mod snapshot;

pub use snapshot::{CounterSnapshot, JobSnapshot, JobTotal};

use crate::models::{CounterReading, LatestCounter, NewReading};
use chrono::{DateTime, NaiveDateTime};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const READING_COLUMNS: &str =
    "c.printer_name, c.ip, c.brand, c.model, c.timestamp, c.total_print, c.total_copy, c.total_scan";

/// Filters out printers listed in report_exclusions (alias `c`).
const NOT_EXCLUDED: &str = "c.printer_name NOT IN (SELECT printer FROM report_exclusions)";

pub struct CounterStore {
    pool: SqlitePool,
}

impl CounterStore {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS printer_counters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                printer_name TEXT NOT NULL,
                ip TEXT NOT NULL DEFAULT '',
                brand TEXT NOT NULL DEFAULT '',
                model TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL,
                total_print INTEGER NOT NULL DEFAULT 0,
                total_copy INTEGER NOT NULL DEFAULT 0,
                total_scan INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_counters_printer_ts ON printer_counters(printer_name, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_counters_ts ON printer_counters(timestamp)",
        )
        .execute(&self.pool)
        .await?;

        registry::init_registry_tables(&self.pool).await?;

        Ok(())
    }

    /// Appends one reading. Repeated polls of the same printer accumulate; nothing is deduplicated.
    #[instrument(skip(self, reading), fields(repo = "counters", operation = "record_counter", printer = %reading.printer_name))]
    pub async fn record_counter(&self, reading: &NewReading) -> anyhow::Result<()> {
        let timestamp = reading
            .timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        sqlx::query(
            "INSERT INTO printer_counters (printer_name, ip, brand, model, timestamp, total_print, total_copy, total_scan)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&reading.printer_name)
        .bind(&reading.ip)
        .bind(&reading.brand)
        .bind(&reading.model)
        .bind(to_millis(timestamp))
        .bind(to_column(reading.counters.print))
        .bind(to_column(reading.counters.copy))
        .bind(to_column(reading.counters.scan))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent reading of every printer that has one, by printer name.
    #[instrument(skip(self), fields(repo = "counters", operation = "latest_per_printer"))]
    pub async fn latest_per_printer(&self) -> anyhow::Result<Vec<LatestCounter>> {
        let sql = format!(
            "SELECT {READING_COLUMNS}, COALESCE(ps.serial, '') AS serial, COALESCE(ps.location, '') AS location
             {}
             LEFT JOIN printer_sources ps ON ps.name = c.printer_name
             ORDER BY c.printer_name ASC",
            latest_join("")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(LatestCounter {
                reading: parse_reading_row(&row)?,
                serial: row.try_get("serial")?,
                location: row.try_get("location")?,
            });
        }
        Ok(out)
    }

    pub async fn count_readings(&self) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM printer_counters")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

/// `FROM` clause yielding the latest reading `c` per printer among rows matching `bounds`
/// (a predicate over alias `c2`, starting with AND, or empty).
fn latest_join(bounds: &str) -> String {
    format!(
        "FROM (SELECT DISTINCT printer_name FROM printer_counters) p
         JOIN printer_counters c ON c.id = (
             SELECT c2.id FROM printer_counters c2
             WHERE c2.printer_name = p.printer_name {bounds}
             ORDER BY c2.timestamp DESC, c2.id DESC
             LIMIT 1
         )"
    )
}

fn parse_reading_row(row: &SqliteRow) -> anyhow::Result<CounterReading> {
    let timestamp: i64 = row.try_get("timestamp")?;
    let total_print: i64 = row.try_get("total_print")?;
    let total_copy: i64 = row.try_get("total_copy")?;
    let total_scan: i64 = row.try_get("total_scan")?;
    Ok(CounterReading {
        printer_name: row.try_get("printer_name")?,
        ip: row.try_get("ip")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        timestamp: from_millis(timestamp),
        total_print: total_print.max(0) as u64,
        total_copy: total_copy.max(0) as u64,
        total_scan: total_scan.max(0) as u64,
    })
}

/// Counters above the INTEGER range saturate instead of wrapping negative.
fn to_column(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

pub(crate) fn to_millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> NaiveDateTime {
    DateTime::from_timestamp_millis(ms)
        .map(|d| d.naive_utc())
        .unwrap_or_default()
}
