// Resolution of display metadata from configured sources, client agents and the readings
// themselves, in that priority order.

use std::collections::HashMap;

use crate::models::{ClientAgent, CounterReading, PrinterSource, UNDEFINED};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub brand: String,
    pub model: String,
    pub serial: String,
    pub location: String,
}

/// Lookup tables keyed by printer name.
#[derive(Debug, Default)]
pub struct MetadataRegistry<'a> {
    sources: HashMap<&'a str, &'a PrinterSource>,
    agents: HashMap<&'a str, &'a ClientAgent>,
}

impl<'a> MetadataRegistry<'a> {
    /// `agents` must be ordered most recently updated first; the first agent seen for a
    /// printer wins.
    pub fn new(sources: &'a [PrinterSource], agents: &'a [ClientAgent]) -> Self {
        let sources = sources.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut by_printer = HashMap::new();
        for agent in agents {
            let name = agent.printer_name.trim();
            if !name.is_empty() {
                by_printer.entry(name).or_insert(agent);
            }
        }
        Self {
            sources,
            agents: by_printer,
        }
    }

    pub fn source(&self, printer: &str) -> Option<&'a PrinterSource> {
        self.sources.get(printer).copied()
    }

    pub fn agent(&self, printer: &str) -> Option<&'a ClientAgent> {
        self.agents.get(printer).copied()
    }

    /// Metadata for `printer`, using `latest` (its most recent in-window reading) as the
    /// last resort before the placeholder.
    pub fn resolve(&self, printer: &str, latest: &CounterReading) -> ResolvedMetadata {
        let src = self.source(printer);
        let agent = self.agent(printer);

        let model = first_present([
            src.map(|s| s.model.as_str()),
            agent.map(|a| a.printer_model.as_str()),
            Some(latest.model.as_str()),
        ]);
        let serial = first_present([
            src.map(|s| s.serial.as_str()),
            agent.map(|a| a.serial.as_str()),
            model,
        ]);
        let location = first_present([
            src.map(|s| s.location.as_str()),
            agent.map(|a| a.location.as_str()),
            agent.map(|a| a.host.as_str()),
        ]);
        let brand = first_present([src.map(|s| s.brand.as_str()), Some(latest.brand.as_str())]);

        ResolvedMetadata {
            brand: or_undefined(brand),
            model: or_undefined(model),
            serial: or_undefined(serial),
            location: or_undefined(location),
        }
    }
}

/// First candidate that is non-blank after trimming.
pub(crate) fn first_present<'s, const N: usize>(candidates: [Option<&'s str>; N]) -> Option<&'s str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub(crate) fn or_undefined(value: Option<&str>) -> String {
    value.unwrap_or(UNDEFINED).to_string()
}
