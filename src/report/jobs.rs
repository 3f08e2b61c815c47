// Page readings derived from the job log rather than hardware counters.

use std::collections::HashMap;

use super::metadata::{first_present, or_undefined};
use crate::models::JobPrinterReading;
use crate::store::JobSnapshot;

/// One row per printer with job pages, largest difference first.
/// Serial resolves source -> latest agent -> printer_models override -> placeholder.
pub fn build_readings(snapshot: &JobSnapshot) -> Vec<JobPrinterReading> {
    let sources: HashMap<&str, &str> = snapshot
        .sources
        .iter()
        .map(|s| (s.name.as_str(), s.serial.as_str()))
        .collect();
    let mut agents: HashMap<&str, &str> = HashMap::new();
    for agent in &snapshot.agents {
        let name = agent.printer_name.trim();
        if !name.is_empty() {
            agents.entry(name).or_insert(agent.serial.as_str());
        }
    }

    let mut out: Vec<JobPrinterReading> = snapshot
        .totals
        .iter()
        .map(|t| {
            let name = t.printer.trim();
            let serial = first_present([
                sources.get(name).copied(),
                agents.get(name).copied(),
                snapshot.models.get(name).map(String::as_str),
            ]);
            JobPrinterReading {
                printer_name: name.to_string(),
                serial: or_undefined(serial),
                reading_initial: t.initial,
                reading_final: t.last,
                difference: t.last.saturating_sub(t.initial),
            }
        })
        .collect();
    out.sort_by(|a, b| b.difference.cmp(&a.difference));
    out
}
