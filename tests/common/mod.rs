// Shared test helpers
#![allow(dead_code)]

use chrono::NaiveDateTime;
use printwatch::models::*;
use printwatch::store::CounterStore;
use tempfile::TempDir;

/// Fresh, initialised store in a temp dir. Keep the TempDir alive for the test's duration.
pub async fn temp_store() -> (TempDir, CounterStore) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counters.db");
    let store = CounterStore::connect(path.to_str().unwrap(), 2).await.unwrap();
    store.init().await.unwrap();
    (dir, store)
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

pub fn reading(printer: &str, at: &str, print: u64, copy: u64, scan: u64) -> NewReading {
    NewReading {
        printer_name: printer.into(),
        ip: "10.0.0.9".into(),
        brand: "Samsung".into(),
        model: String::new(),
        counters: Counters { print, copy, scan },
        timestamp: Some(ts(at)),
    }
}

pub fn source(name: &str, brand: &str, counter_url: &str) -> NewPrinterSource {
    NewPrinterSource {
        name: name.into(),
        ip: "10.0.0.9".into(),
        brand: brand.into(),
        model: String::new(),
        serial: String::new(),
        location: String::new(),
        counter_url: counter_url.into(),
        enabled: true,
    }
}

pub async fn record_all(store: &CounterStore, readings: &[NewReading]) {
    for r in readings {
        store.record_counter(r).await.unwrap();
    }
}

/// Brother-style maintenance page (label-first markup).
pub const BROTHER_PAGE: &str = r#"
<html><head><title>Brother DCP-8157DN</title></head><body>
<table>
<tr><td><DD>Copy</DD></TD><TD>1,204</TD></tr>
<tr><td><DD>Print</DD></TD><TD>35,870</TD></tr>
<tr><td><DD>ADF(SX)</DD></TD><TD>310</TD></tr>
<tr><td><DD>ADF(DX)</DD></TD><TD>12</TD></tr>
<tr><td><DD>Flatbed</DD></TD><TD>88</TD></tr>
</table></body></html>
"#;

/// SyncThru landing page without counters.
pub const SYNCTHRU_INDEX: &str =
    "<html><head><title>SyncThru Web Service</title></head><body>loading...</body></html>";

pub const SYNCTHRU_COUNTERS_JSON: &str = r#"{
 GXI_BILLING_PRINT_TOTAL_IMP_CNT: 48213,
 GXI_BILLING_COPY_TOTAL_IMP_CNT: 9120,
 GXI_BILLING_SEND_TO_TOTAL_CNT: 402
}"#;
