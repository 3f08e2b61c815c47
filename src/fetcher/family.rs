// Vendor family classification and the parse strategy each family carries.

use crate::models::Counters;
use crate::parser::{parse_label_first, parse_script, parse_table_row};

type Parser = fn(&str) -> Counters;

const EVERY_LAYOUT: &[Parser] = &[parse_label_first, parse_script, parse_table_row];
const SYNCTHRU_LAYOUTS: &[Parser] = &[parse_script, parse_table_row];

const LABEL_FIRST_TOKENS: &[&str] = &["brother", "dcp", "hl", "mfc"];
const SYNCTHRU_TOKENS: &[&str] = &["samsung", "syncthru"];

/// Paths tried on the printer's host when a SyncThru page yields nothing.
pub const SYNCTHRU_ALTERNATE_PATHS: &[&str] = &[
    "/sws/app/information/counters/counters.json",
    "/sws/app/information/counters/counters.html",
    "/sws/index.html",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorFamily {
    /// Brother-style `<dd>` label cells.
    LabelFirst,
    /// Samsung SyncThru: embedded key-value script or a totals table.
    SyncThru,
    /// Nothing identified the vendor; every parser is tried.
    Generic,
}

impl VendorFamily {
    /// Brand decides first, then model, then a fingerprint in the fetched body.
    pub fn classify(brand: &str, model: &str, body: &str) -> Self {
        Self::from_hint(brand)
            .or_else(|| Self::from_hint(model))
            .or_else(|| Self::sniff(body))
            .unwrap_or(VendorFamily::Generic)
    }

    fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.to_lowercase();
        if LABEL_FIRST_TOKENS.iter().any(|t| hint.contains(t)) {
            Some(VendorFamily::LabelFirst)
        } else if SYNCTHRU_TOKENS.iter().any(|t| hint.contains(t)) {
            Some(VendorFamily::SyncThru)
        } else {
            None
        }
    }

    fn sniff(body: &str) -> Option<Self> {
        let body = body.to_lowercase();
        if body.contains("syncthru") {
            Some(VendorFamily::SyncThru)
        } else if body.contains("brother") {
            Some(VendorFamily::LabelFirst)
        } else {
            None
        }
    }

    fn parsers(self) -> &'static [Parser] {
        match self {
            VendorFamily::LabelFirst | VendorFamily::Generic => EVERY_LAYOUT,
            VendorFamily::SyncThru => SYNCTHRU_LAYOUTS,
        }
    }

    /// First non-empty result of the family's parsers, or all-zero.
    pub fn parse(self, body: &str) -> Counters {
        self.parsers()
            .iter()
            .map(|parse| parse(body))
            .find(|c| !c.is_empty())
            .unwrap_or_default()
    }

    pub fn alternate_paths(self) -> &'static [&'static str] {
        match self {
            VendorFamily::SyncThru => SYNCTHRU_ALTERNATE_PATHS,
            VendorFamily::LabelFirst | VendorFamily::Generic => &[],
        }
    }
}
