// Per-printer window deltas and their accumulation into grouped report rows.

use std::collections::HashMap;

use super::baseline::{self, BaselineRule};
use super::metadata::{MetadataRegistry, ResolvedMetadata};
use crate::models::{CounterReading, GroupBy, Metric, ReportQuery, ReportRow, UNDEFINED};
use crate::store::CounterSnapshot;

/// One printer's movement over the window for a single metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterDelta<'s> {
    pub printer: &'s str,
    /// Most recent in-window reading.
    pub latest: &'s CounterReading,
    pub rule: BaselineRule,
    pub initial: u64,
    pub last: u64,
    /// `max(0, last - initial)`.
    pub difference: u64,
}

/// Deltas for every printer with at least one in-window reading, in printer order.
pub fn printer_deltas(snapshot: &CounterSnapshot, metric: Metric) -> Vec<PrinterDelta<'_>> {
    snapshot
        .readings
        .chunk_by(|a, b| a.printer_name == b.printer_name)
        .filter_map(|run| {
            let (first, latest) = (run.first()?, run.last()?);
            let printer = first.printer_name.as_str();
            let (base, rule) = baseline::resolve(
                snapshot.previous_day.get(printer),
                snapshot.earlier.get(printer),
                first,
            );
            let initial = base.value(metric);
            let last = latest.value(metric);
            Some(PrinterDelta {
                printer,
                latest,
                rule,
                initial,
                last,
                difference: last.saturating_sub(initial),
            })
        })
        .collect()
}

/// Grouped rows sorted by difference, largest first. Ties keep first-appearance order.
pub fn build_report(snapshot: &CounterSnapshot, query: &ReportQuery) -> Vec<ReportRow> {
    let registry = MetadataRegistry::new(&snapshot.sources, &snapshot.agents);
    let mut rows: Vec<ReportRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for delta in printer_deltas(snapshot, query.metric) {
        let meta = registry.resolve(delta.printer, delta.latest);
        let key = group_key(query.group_by, delta.printer, &meta);

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(empty_row(key.clone(), query.metric));
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.jobs += 1;
        row.pages += delta.difference;
        row.difference += delta.difference;
        row.reading_initial += delta.initial;
        row.reading_final += delta.last;
        if query.group_by == GroupBy::Printer {
            row.printer_name = key;
        } else if row.printer_name.is_empty() {
            row.printer_name = delta.printer.to_string();
        }
        row.brand = meta.brand;
        row.model = meta.model;
        row.serial = meta.serial;
        row.location = meta.location;
    }

    rows.sort_by(|a, b| b.difference.cmp(&a.difference));
    rows
}

fn group_key(group_by: GroupBy, printer: &str, meta: &ResolvedMetadata) -> String {
    let key = match group_by {
        GroupBy::Printer => printer.trim(),
        GroupBy::Brand => meta.brand.as_str(),
        GroupBy::Model => meta.model.as_str(),
        GroupBy::Serial => meta.serial.as_str(),
    };
    if key.is_empty() {
        UNDEFINED.to_string()
    } else {
        key.to_string()
    }
}

fn empty_row(group_name: String, metric: Metric) -> ReportRow {
    ReportRow {
        group_name,
        jobs: 0,
        pages: 0,
        reading_initial: 0,
        reading_final: 0,
        difference: 0,
        printer_name: String::new(),
        brand: String::new(),
        model: String::new(),
        serial: String::new(),
        location: String::new(),
        metric,
    }
}
