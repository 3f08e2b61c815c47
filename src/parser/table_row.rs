// Table-row markup (Samsung SyncThru counters page, pt-BR firmware).

use std::sync::LazyLock;

use regex::Regex;

use super::{CellLabel, to_int};
use crate::models::Counters;

static TOTAL_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s+de\s+impress[oõ]es[\s\S]*?</tr>").expect("valid total row regex")
});
static NUMERIC_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s*([0-9.,]+)\s*<").expect("valid numeric cell regex"));

static PRINT: LazyLock<CellLabel> = LazyLock::new(|| CellLabel::new("Imprimir"));
static COPY: LazyLock<CellLabel> = LazyLock::new(|| CellLabel::new("Copiar"));
static SCAN: LazyLock<CellLabel> = LazyLock::new(|| CellLabel::new("Digitalizar"));
static SCAN_EN: LazyLock<CellLabel> = LazyLock::new(|| CellLabel::new("Scan"));

/// The "total impressions" row holds print then copy; per-field labels are the fallback.
pub fn parse_table_row(html: &str) -> Counters {
    let (mut print, mut copy) = total_row(html).unwrap_or((0, 0));

    if print == 0 {
        print = PRINT.find(html);
    }
    if copy == 0 {
        copy = COPY.find(html);
    }

    let mut scan = SCAN.find(html);
    if scan == 0 {
        scan = SCAN_EN.find(html);
    }

    Counters { print, copy, scan }
}

fn total_row(html: &str) -> Option<(u64, u64)> {
    let row = TOTAL_ROW.find(html)?.as_str();
    let mut cells = NUMERIC_CELL
        .captures_iter(row)
        .filter_map(|c| c.get(1))
        .map(|m| to_int(m.as_str()));
    let print = cells.next()?;
    let copy = cells.next()?;
    Some((print, copy))
}
