// Registry writes from collaborators: agent heartbeats, job-log uploads, model overrides,
// report exclusions

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::models::{ClientAgent, NewClientAgent, PrintJob};
use crate::store::CounterStore;

/// Agent heartbeat body, as workstation agents send it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Heartbeat {
    agent_id: String,
    host: String,
    printer_name: String,
    printer_model: String,
    printer_serial: String,
    location: String,
    client_ip: String,
    agent_version: String,
}

impl Heartbeat {
    /// None unless host and printer are known. A blank `agent_id` becomes `host|printer`.
    fn agent(&self) -> Option<NewClientAgent> {
        let host = self.host.trim();
        let printer = self.printer_name.trim();
        if host.is_empty() || printer.is_empty() {
            return None;
        }
        let agent_id = match self.agent_id.trim() {
            "" => format!("{host}|{printer}"),
            id => id.to_string(),
        };
        Some(NewClientAgent {
            agent_id,
            host: host.to_string(),
            printer_name: printer.to_string(),
            printer_model: self.printer_model.trim().to_string(),
            serial: self.printer_serial.trim().to_string(),
            location: self.location.trim().to_string(),
            ip: self.client_ip.trim().to_string(),
            version: self.agent_version.trim().to_string(),
        })
    }
}

/// One job-log record uploaded by an agent.
#[derive(Debug, Deserialize)]
pub(super) struct ClientJob {
    #[serde(alias = "submitted")]
    timestamp: NaiveDateTime,
    printer: String,
    #[serde(default)]
    pages: u64,
    #[serde(default = "one")]
    copies: u64,
    #[serde(default)]
    client_host: String,
    #[serde(default)]
    agent_id: String,
    #[serde(default)]
    printer_model: String,
    #[serde(default)]
    printer_serial: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    client_ip: String,
    #[serde(default)]
    agent_version: String,
}

fn one() -> u64 {
    1
}

impl ClientJob {
    fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            agent_id: self.agent_id.clone(),
            host: self.client_host.clone(),
            printer_name: self.printer.clone(),
            printer_model: self.printer_model.clone(),
            printer_serial: self.printer_serial.clone(),
            location: self.location.clone(),
            client_ip: self.client_ip.clone(),
            agent_version: self.agent_version.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PrinterModel {
    printer: String,
    model: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Exclusion {
    printer: String,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExclusionKey {
    printer: String,
}

/// Stores the agent and, when it reports one, its printer's model.
async fn register_agent(store: &CounterStore, agent: &NewClientAgent) -> anyhow::Result<()> {
    store.upsert_client_agent(agent).await?;
    if !agent.printer_model.is_empty() {
        store
            .upsert_printer_model(&agent.printer_name, &agent.printer_model)
            .await?;
    }
    Ok(())
}

/// POST /api/agents/heartbeat
pub(super) async fn heartbeat(
    State(state): State<AppState>,
    Json(body): Json<Heartbeat>,
) -> Result<Json<Value>, ApiError> {
    let agent = body
        .agent()
        .ok_or_else(|| ApiError::BadRequest("host and printer_name are required".into()))?;
    register_agent(&state.store, &agent).await?;
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn list_agents(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientAgent>>, ApiError> {
    Ok(Json(state.store.list_client_agents().await?))
}

/// POST /api/client-jobs - registers each reporting agent, then appends the page counts.
pub(super) async fn client_jobs(
    State(state): State<AppState>,
    Json(records): Json<Vec<ClientJob>>,
) -> Result<Json<Value>, ApiError> {
    if records.iter().any(|r| r.printer.trim().is_empty()) {
        return Err(ApiError::BadRequest("every job needs a printer".into()));
    }
    for record in &records {
        if let Some(agent) = record.heartbeat().agent() {
            register_agent(&state.store, &agent).await?;
        }
    }
    let jobs: Vec<PrintJob> = records
        .into_iter()
        .map(|r| PrintJob {
            timestamp: r.timestamp,
            printer: r.printer.trim().to_string(),
            pages: r.pages,
            copies: r.copies,
        })
        .collect();
    let inserted = state.store.insert_jobs(&jobs).await?;
    Ok(Json(json!({ "ok": true, "inserted": inserted })))
}

pub(super) async fn upsert_printer_model(
    State(state): State<AppState>,
    Json(body): Json<PrinterModel>,
) -> Result<Json<Value>, ApiError> {
    let (printer, model) = (body.printer.trim(), body.model.trim());
    if printer.is_empty() || model.is_empty() {
        return Err(ApiError::BadRequest("printer and model are required".into()));
    }
    state.store.upsert_printer_model(printer, model).await?;
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn list_exclusions(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.list_exclusions().await?))
}

pub(super) async fn add_exclusion(
    State(state): State<AppState>,
    Json(body): Json<Exclusion>,
) -> Result<Json<Value>, ApiError> {
    if body.printer.trim().is_empty() {
        return Err(ApiError::BadRequest("printer is required".into()));
    }
    state.store.add_exclusion(&body.printer, &body.note).await?;
    Ok(Json(json!({ "ok": true })))
}

/// DELETE /api/exclusions?printer=...
pub(super) async fn remove_exclusion(
    State(state): State<AppState>,
    Query(key): Query<ExclusionKey>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.store.remove_exclusion(&key.printer).await?;
    Ok(Json(json!({ "ok": true, "removed": removed })))
}
