// Counter extraction from printer web pages. Every function here is pure and total:
// unknown layouts yield zeros, never errors.

mod label_first;
mod script;
mod table_row;

use regex::Regex;

pub use label_first::parse_label_first;
pub use script::parse_script;
pub use table_row::parse_table_row;

/// Digits only; separators, units and stray text are dropped. Empty input, or a value that
/// does not fit a signed 64-bit column, is 0.
pub fn to_int(value: &str) -> u64 {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().map_or(0, i64::unsigned_abs)
}

/// First capture group of `re` in `text`, as an integer.
fn capture_int(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map_or(0, |m| to_int(m.as_str()))
}

/// Generic "label ... </td><td>value" lookup shared by the HTML families.
struct CellLabel(Regex);

impl CellLabel {
    /// `label` is a regex fragment.
    fn new(label: &str) -> Self {
        let pattern = format!(r"(?i){label}[\s\S]*?</td>\s*<td[^>]*>\s*([0-9.,]+)(?:\s*pages)?");
        Self(Regex::new(&pattern).expect("valid cell label regex"))
    }

    fn find(&self, text: &str) -> u64 {
        capture_int(&self.0, text)
    }
}
