// Metadata registries the reports merge: configured sources, client agents, job-log pages.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A polled device as configured. `name` is the display key readings refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterSource {
    pub id: i64,
    pub name: String,
    pub ip: String,
    pub brand: String,
    pub model: String,
    pub serial: String,
    pub location: String,
    pub counter_url: String,
    pub enabled: bool,
    pub last_error: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// A `[[printers]]` config entry; upserted into the store by name at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPrinterSource {
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub location: String,
    pub counter_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Printer metadata reported by a workstation agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAgent {
    pub agent_id: String,
    pub host: String,
    pub printer_name: String,
    pub printer_model: String,
    pub serial: String,
    pub location: String,
    pub ip: String,
    pub version: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClientAgent {
    pub agent_id: String,
    #[serde(default)]
    pub host: String,
    pub printer_name: String,
    #[serde(default)]
    pub printer_model: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub version: String,
}

/// Page count of one job-log entry; total pages = pages * copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJob {
    pub timestamp: NaiveDateTime,
    pub printer: String,
    pub pages: u64,
    #[serde(default = "default_copies")]
    pub copies: u64,
}

fn default_copies() -> u64 {
    1
}
