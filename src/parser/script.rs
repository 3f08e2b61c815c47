// Embedded key-value script (SyncThru counters.json / inline JS): `GXI_...: 1234`.

use std::sync::LazyLock;

use regex::Regex;

use super::capture_int;
use crate::models::Counters;

const PRINT_KEY: &str = "GXI_BILLING_PRINT_TOTAL_IMP_CNT";
const COPY_KEY: &str = "GXI_BILLING_COPY_TOTAL_IMP_CNT";
const SCAN_KEY: &str = "GXI_BILLING_SEND_TO_TOTAL_CNT";
const SCAN_FALLBACK_KEY: &str = "GXI_BILLING_SEND_TOTAL_CNT";

fn key_regex(key: &str) -> Regex {
    let pattern = format!(r"(?i)\b{}\b\s*:\s*([0-9.,]+)", regex::escape(key));
    Regex::new(&pattern).expect("valid script key regex")
}

static KEYS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        key_regex(PRINT_KEY),
        key_regex(COPY_KEY),
        key_regex(SCAN_KEY),
        key_regex(SCAN_FALLBACK_KEY),
    ]
});

pub fn parse_script(text: &str) -> Counters {
    let [print, copy, scan, scan_fallback] = &*KEYS;
    let mut scan_total = capture_int(scan, text);
    if scan_total == 0 {
        scan_total = capture_int(scan_fallback, text);
    }
    Counters {
        print: capture_int(print, text),
        copy: capture_int(copy, text),
        scan: scan_total,
    }
}
