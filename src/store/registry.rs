// Registries merged into reports: printer sources, client agents, model overrides,
// job-log page counts and report exclusions.

use super::{CounterStore, from_millis, to_millis};
use crate::models::{ClientAgent, NewClientAgent, NewPrinterSource, PrintJob, PrinterSource};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub(super) const SOURCE_COLUMNS: &str =
    "id, name, ip, brand, model, serial, location, counter_url, enabled, last_error, updated_at";

pub(super) const AGENT_COLUMNS: &str =
    "agent_id, host, printer_name, printer_model, serial, location, ip, version, updated_at";

pub(super) async fn init_registry_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS printer_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            ip TEXT NOT NULL DEFAULT '',
            brand TEXT NOT NULL DEFAULT '',
            model TEXT NOT NULL DEFAULT '',
            serial TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            counter_url TEXT NOT NULL DEFAULT '',
            enabled INTEGER NOT NULL DEFAULT 1,
            last_error TEXT,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_agents (
            agent_id TEXT PRIMARY KEY,
            host TEXT NOT NULL DEFAULT '',
            printer_name TEXT NOT NULL DEFAULT '',
            printer_model TEXT NOT NULL DEFAULT '',
            serial TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            ip TEXT NOT NULL DEFAULT '',
            version TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS printer_models (printer TEXT PRIMARY KEY, model TEXT NOT NULL DEFAULT '', updated_at INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            printer TEXT NOT NULL,
            pages INTEGER NOT NULL DEFAULT 0,
            copies INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_printer_ts ON jobs(printer, timestamp)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS report_exclusions (printer TEXT PRIMARY KEY, note TEXT NOT NULL DEFAULT '', updated_at INTEGER NOT NULL)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn now_millis() -> i64 {
    to_millis(chrono::Local::now().naive_local())
}

impl CounterStore {
    /// Inserts or updates a source keyed by name. `last_error` is left untouched on update.
    #[instrument(skip(self, source), fields(repo = "registry", operation = "upsert_source", printer = %source.name))]
    pub async fn upsert_source(&self, source: &NewPrinterSource) -> anyhow::Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO printer_sources (name, ip, brand, model, serial, location, counter_url, enabled, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(name) DO UPDATE SET
                ip = excluded.ip,
                brand = excluded.brand,
                model = excluded.model,
                serial = excluded.serial,
                location = excluded.location,
                counter_url = excluded.counter_url,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(source.name.trim())
        .bind(source.ip.trim())
        .bind(source.brand.trim())
        .bind(source.model.trim())
        .bind(source.serial.trim())
        .bind(source.location.trim())
        .bind(source.counter_url.trim())
        .bind(source.enabled)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list_sources(&self) -> anyhow::Result<Vec<PrinterSource>> {
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM printer_sources ORDER BY name ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(parse_source_row).collect()
    }

    pub async fn list_enabled_sources(&self) -> anyhow::Result<Vec<PrinterSource>> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM printer_sources WHERE enabled <> 0 ORDER BY name ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(parse_source_row).collect()
    }

    pub async fn get_source(&self, id: i64) -> anyhow::Result<Option<PrinterSource>> {
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM printer_sources WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(parse_source_row).transpose()
    }

    /// Records (or clears, with None) the outcome of the last poll of a source.
    #[instrument(skip(self, error), fields(repo = "registry", operation = "set_source_error"))]
    pub async fn set_source_error(&self, id: i64, error: Option<&str>) -> anyhow::Result<()> {
        sqlx::query("UPDATE printer_sources SET last_error = $1, updated_at = $2 WHERE id = $3")
            .bind(error)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, agent), fields(repo = "registry", operation = "upsert_client_agent", agent_id = %agent.agent_id))]
    pub async fn upsert_client_agent(&self, agent: &NewClientAgent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_agents (agent_id, host, printer_name, printer_model, serial, location, ip, version, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(agent_id) DO UPDATE SET
                host = excluded.host,
                printer_name = excluded.printer_name,
                printer_model = excluded.printer_model,
                serial = excluded.serial,
                location = excluded.location,
                ip = excluded.ip,
                version = excluded.version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&agent.agent_id)
        .bind(&agent.host)
        .bind(&agent.printer_name)
        .bind(&agent.printer_model)
        .bind(&agent.serial)
        .bind(&agent.location)
        .bind(&agent.ip)
        .bind(&agent.version)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recently updated agents first.
    pub async fn list_client_agents(&self) -> anyhow::Result<Vec<ClientAgent>> {
        let sql = format!("SELECT {AGENT_COLUMNS} FROM client_agents ORDER BY updated_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(parse_agent_row).collect()
    }

    pub async fn upsert_printer_model(&self, printer: &str, model: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO printer_models (printer, model, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(printer) DO UPDATE SET model = excluded.model, updated_at = excluded.updated_at",
        )
        .bind(printer)
        .bind(model)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Appends job-log page counts in one transaction. Returns the number of rows written.
    #[instrument(skip(self, jobs), fields(repo = "registry", operation = "insert_jobs", jobs_count = jobs.len()))]
    pub async fn insert_jobs(&self, jobs: &[PrintJob]) -> anyhow::Result<u64> {
        if jobs.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        for job in jobs {
            sqlx::query("INSERT INTO jobs (timestamp, printer, pages, copies) VALUES ($1, $2, $3, $4)")
                .bind(to_millis(job.timestamp))
                .bind(&job.printer)
                .bind(job.pages as i64)
                .bind(job.copies as i64)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(jobs.len() as u64)
    }

    /// Hides a printer from every counter and job report.
    pub async fn add_exclusion(&self, printer: &str, note: &str) -> anyhow::Result<()> {
        let printer = printer.trim();
        anyhow::ensure!(!printer.is_empty(), "excluded printer name must be non-empty");
        sqlx::query(
            "INSERT INTO report_exclusions (printer, note, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(printer) DO UPDATE SET note = excluded.note, updated_at = excluded.updated_at",
        )
        .bind(printer)
        .bind(note.trim())
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_exclusion(&self, printer: &str) -> anyhow::Result<bool> {
        let r = sqlx::query("DELETE FROM report_exclusions WHERE printer = $1")
            .bind(printer.trim())
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }

    pub async fn list_exclusions(&self) -> anyhow::Result<Vec<String>> {
        let names = sqlx::query_scalar("SELECT printer FROM report_exclusions ORDER BY printer ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}

pub(super) fn parse_source_row(row: &SqliteRow) -> anyhow::Result<PrinterSource> {
    let enabled: i64 = row.try_get("enabled")?;
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(PrinterSource {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        ip: row.try_get("ip")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        serial: row.try_get("serial")?,
        location: row.try_get("location")?,
        counter_url: row.try_get("counter_url")?,
        enabled: enabled != 0,
        last_error: row.try_get("last_error")?,
        updated_at: from_millis(updated_at),
    })
}

pub(super) fn parse_agent_row(row: &SqliteRow) -> anyhow::Result<ClientAgent> {
    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(ClientAgent {
        agent_id: row.try_get("agent_id")?,
        host: row.try_get("host")?,
        printer_name: row.try_get("printer_name")?,
        printer_model: row.try_get("printer_model")?,
        serial: row.try_get("serial")?,
        location: row.try_get("location")?,
        ip: row.try_get("ip")?,
        version: row.try_get("version")?,
        updated_at: from_millis(updated_at),
    })
}
