// Decomposition of the counter series into consecutive per-printer deltas, summed per
// calendar day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{CounterReading, DailyTotal, Window};

/// Clamped movement of print and copy between two consecutive readings of one printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    print: u64,
    copy: u64,
}

impl Step {
    fn between(prev: &CounterReading, curr: &CounterReading) -> Self {
        Self {
            print: curr.total_print.saturating_sub(prev.total_print),
            copy: curr.total_copy.saturating_sub(prev.total_copy),
        }
    }

    fn pages(self) -> u64 {
        self.print + self.copy
    }
}

/// Pairs every reading with its step from the previous reading of the same printer.
/// `readings` must be ordered by printer, then time; first readings step by zero.
fn steps(readings: &[CounterReading]) -> impl Iterator<Item = (&CounterReading, Step)> {
    readings
        .chunk_by(|a, b| a.printer_name == b.printer_name)
        .flat_map(|run| {
            run.iter().enumerate().map(move |(i, curr)| {
                let prev = if i == 0 { curr } else { &run[i - 1] };
                (curr, Step::between(prev, curr))
            })
        })
}

/// Pages per calendar day. Readings before the window still seed each printer's previous
/// value; only in-window readings are credited.
pub fn daily_totals(readings: &[CounterReading], window: &Window) -> Vec<DailyTotal> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (reading, step) in steps(readings) {
        if !window.contains(reading.timestamp) {
            continue;
        }
        *per_day.entry(reading.timestamp.date()).or_default() += step.pages();
    }
    per_day
        .into_iter()
        .map(|(day, pages)| DailyTotal { day, pages })
        .collect()
}
