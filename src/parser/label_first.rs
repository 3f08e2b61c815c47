// Label-first markup (Brother web UI): <dt>/<dd> label cell followed by a value cell.

use std::sync::LazyLock;

use regex::Regex;

use super::{CellLabel, capture_int};
use crate::models::Counters;

struct Field {
    dd: Regex,
    cell: CellLabel,
}

impl Field {
    fn new(label: &str) -> Self {
        let dd = format!(r"(?i)<DD>\s*{label}\s*</DD>\s*</TD>\s*<TD[^>]*>\s*([0-9.,]+)");
        Self {
            dd: Regex::new(&dd).expect("valid dd label regex"),
            cell: CellLabel::new(label),
        }
    }

    fn dd(&self, html: &str) -> u64 {
        capture_int(&self.dd, html)
    }
}

struct Fields {
    copy: Field,
    print: Field,
    adf_simplex: Field,
    adf_duplex: Field,
    flatbed: Field,
}

static FIELDS: LazyLock<Fields> = LazyLock::new(|| Fields {
    copy: Field::new("Copy"),
    print: Field::new("Print"),
    adf_simplex: Field::new(r"ADF\(SX\)"),
    adf_duplex: Field::new(r"ADF\(DX\)"),
    flatbed: Field::new("Flatbed"),
});

/// Scan is the sum of ADF single-sided, ADF duplex and flatbed scans.
pub fn parse_label_first(html: &str) -> Counters {
    let f = &*FIELDS;

    let mut copy = f.copy.dd(html);
    let mut print = f.print.dd(html);
    let mut scans = [
        f.adf_simplex.dd(html),
        f.adf_duplex.dd(html),
        f.flatbed.dd(html),
    ];

    if copy == 0 {
        copy = f.copy.cell.find(html);
    }
    if print == 0 {
        print = f.print.cell.find(html);
    }
    if scans.iter().all(|&v| v == 0) {
        scans = [
            f.adf_simplex.cell.find(html),
            f.adf_duplex.cell.find(html),
            f.flatbed.cell.find(html),
        ];
    }

    Counters {
        print,
        copy,
        scan: scans.iter().sum(),
    }
}
