// Lifetime counters as reported by a printer, and the readings persisted from them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The three cumulative totals a printer exposes. All-zero means "nothing extracted".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub print: u64,
    pub copy: u64,
    pub scan: u64,
}

impl Counters {
    pub fn is_empty(&self) -> bool {
        self.print == 0 && self.copy == 0 && self.scan == 0
    }
}

/// Which counter a report measures; serializes lowercase ("print", "copy", "scan").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Print,
    Copy,
    Scan,
}

impl Metric {
    /// Parse a query-string value; anything unrecognised reports on prints.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "copy" => Metric::Copy,
            "scan" => Metric::Scan,
            _ => Metric::Print,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Print => "print",
            Metric::Copy => "copy",
            Metric::Scan => "scan",
        }
    }
}

/// One persisted observation. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReading {
    pub printer_name: String,
    pub ip: String,
    pub brand: String,
    pub model: String,
    pub timestamp: NaiveDateTime,
    pub total_print: u64,
    pub total_copy: u64,
    pub total_scan: u64,
}

impl CounterReading {
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Print => self.total_print,
            Metric::Copy => self.total_copy,
            Metric::Scan => self.total_scan,
        }
    }
}

/// Input to `CounterStore::record_counter`. A missing timestamp means "now" (local time).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewReading {
    pub printer_name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub counters: Counters,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Most recent reading of a printer, joined with its configured serial/location.
#[derive(Debug, Clone, Serialize)]
pub struct LatestCounter {
    #[serde(flatten)]
    pub reading: CounterReading,
    pub serial: String,
    pub location: String,
}
