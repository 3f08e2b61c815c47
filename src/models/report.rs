// Report inputs (window, grouping) and the rows handed to the presentation layer.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Metric;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date or datetime: {0:?}")]
    InvalidDate(String),
}

/// Inclusive reporting window. `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub since: Option<NaiveDateTime>,
    pub until: Option<NaiveDateTime>,
}

impl Window {
    pub fn new(since: Option<NaiveDateTime>, until: Option<NaiveDateTime>) -> Self {
        Self { since, until }
    }

    /// Bare dates widen to 00:00:00 (since) and 23:59:59.999999 (until); datetimes are kept.
    /// Blank strings are treated as absent.
    pub fn from_params(since: Option<&str>, until: Option<&str>) -> Result<Self, WindowError> {
        let since = since
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_bound(s, NaiveTime::MIN))
            .transpose()?;
        let until = until
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_bound(s, end_of_day()))
            .transpose()?;
        Ok(Self { since, until })
    }

    /// Whole calendar days, as the presentation layer passes them.
    pub fn days(since: NaiveDate, until: NaiveDate) -> Self {
        Self {
            since: Some(since.and_time(NaiveTime::MIN)),
            until: Some(until.and_time(end_of_day())),
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.since.is_none_or(|s| ts >= s) && self.until.is_none_or(|u| ts <= u)
    }

    /// Start of the "previous day" baseline range, one day before `since`.
    pub fn previous_day_start(&self) -> Option<NaiveDateTime> {
        self.since.and_then(|s| s.checked_sub_days(Days::new(1)))
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

fn parse_bound(s: &str, time_for_date: NaiveTime) -> Result<NaiveDateTime, WindowError> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(time_for_date));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| WindowError::InvalidDate(s.to_string()))
}

/// Dimension report rows are bucketed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Printer,
    Brand,
    Model,
    Serial,
}

impl GroupBy {
    /// Parse a query-string value; anything unrecognised groups by printer.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "brand" => GroupBy::Brand,
            "model" => GroupBy::Model,
            "serial" => GroupBy::Serial,
            _ => GroupBy::Printer,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub window: Window,
    pub group_by: GroupBy,
    pub metric: Metric,
}

/// One grouped row of the counter report. Sums are of per-printer clamped deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub group_name: String,
    /// Printers contributing to this group.
    pub jobs: u64,
    pub pages: u64,
    pub reading_initial: u64,
    pub reading_final: u64,
    pub difference: u64,
    pub printer_name: String,
    pub brand: String,
    pub model: String,
    pub serial: String,
    pub location: String,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub pages: u64,
}

/// Positive movement between two consecutive readings of one printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterEvent {
    pub timestamp: NaiveDateTime,
    pub printer: String,
    pub pages: u64,
    pub delta_print: u64,
    pub delta_copy: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPrinterReading {
    pub printer_name: String,
    pub serial: String,
    pub reading_initial: u64,
    pub reading_final: u64,
    pub difference: u64,
}
