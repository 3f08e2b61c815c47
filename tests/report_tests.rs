// Report tests over a real store: baselines, clamped grouping, metadata merge, daily totals,
// events, exclusions and job-printer readings

mod common;

use chrono::NaiveDate;
use common::{reading, record_all, source, temp_store, ts};
use printwatch::models::{
    GroupBy, Metric, NewClientAgent, PrintJob, ReportQuery, UNDEFINED, Window,
};
use printwatch::report;

fn query(since: &str, until: &str, group_by: GroupBy, metric: Metric) -> ReportQuery {
    ReportQuery {
        window: Window::from_params(Some(since), Some(until)).unwrap(),
        group_by,
        metric,
    }
}

#[tokio::test]
async fn day_before_reading_is_the_baseline() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-03-08T12:00:00", 100, 0, 0),
            reading("P1", "2026-03-09T12:00:00", 150, 0, 0),
            reading("P1", "2026-03-10T01:00:00", 160, 0, 0),
        ],
    )
    .await;

    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Printer, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reading_initial, 150);
    assert_eq!(rows[0].reading_final, 160);
    assert_eq!(rows[0].difference, 10);
}

#[tokio::test]
async fn older_history_is_used_when_day_before_is_empty() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-02-01T12:00:00", 90, 0, 0),
            reading("P1", "2026-03-10T08:00:00", 130, 0, 0),
            reading("P1", "2026-03-10T18:00:00", 140, 0, 0),
        ],
    )
    .await;
    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Printer, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows[0].reading_initial, 90);
    assert_eq!(rows[0].difference, 50);
}

#[tokio::test]
async fn first_appearance_yields_zero() {
    let (_dir, store) = temp_store().await;
    record_all(&store, &[reading("NEW", "2026-03-10T09:00:00", 250_000, 0, 0)]).await;
    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Printer, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows[0].reading_final, 250_000);
    assert_eq!(rows[0].difference, 0);
}

#[tokio::test]
async fn difference_is_never_negative_under_resets() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-03-09T12:00:00", 9_000, 300, 10),
            reading("P1", "2026-03-10T12:00:00", 40, 310, 2),
        ],
    )
    .await;
    for metric in [Metric::Print, Metric::Copy, Metric::Scan] {
        let rows = report::counter_report(
            &store,
            &query("2026-03-10", "2026-03-10", GroupBy::Printer, metric),
        )
        .await
        .unwrap();
        let expected = match metric {
            Metric::Copy => 10,
            _ => 0,
        };
        assert_eq!(rows[0].difference, expected, "metric {metric:?}");
        assert_eq!(rows[0].metric, metric);
    }
}

#[tokio::test]
async fn grouped_difference_sums_clamped_printer_deltas() {
    let (_dir, store) = temp_store().await;
    for name in ["P1", "P2"] {
        let mut src = source(name, "Samsung", "http://10.0.0.9/sws/index.html");
        src.model = "SL-M4070".into();
        store.upsert_source(&src).await.unwrap();
    }
    record_all(
        &store,
        &[
            // P1 resets inside the window.
            reading("P1", "2026-03-09T12:00:00", 1_000, 0, 0),
            reading("P1", "2026-03-10T12:00:00", 100, 0, 0),
            reading("P2", "2026-03-09T12:00:00", 200, 0, 0),
            reading("P2", "2026-03-10T12:00:00", 500, 0, 0),
        ],
    )
    .await;

    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Model, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.group_name, "SL-M4070");
    assert_eq!(row.jobs, 2);
    assert_eq!(row.difference, 300);
    // max(0, Σfinal - Σinitial) would give 0.
    assert_eq!((row.reading_initial, row.reading_final), (1_200, 600));
}

#[tokio::test]
async fn metadata_merges_sources_agents_and_readings() {
    let (_dir, store) = temp_store().await;
    let mut src = source("CONFIGURED", "Brother", "http://10.0.0.9/");
    src.serial = "SRC-SN".into();
    store.upsert_source(&src).await.unwrap();
    store
        .upsert_client_agent(&NewClientAgent {
            agent_id: "agent-1".into(),
            host: "pc-fiscal".into(),
            printer_name: "AGENT-ONLY".into(),
            printer_model: "MFC-L2710".into(),
            serial: "AG-SN".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    record_all(
        &store,
        &[
            reading("CONFIGURED", "2026-03-10T09:00:00", 1, 0, 0),
            reading("AGENT-ONLY", "2026-03-10T09:00:00", 1, 0, 0),
            reading("BARE", "2026-03-10T09:00:00", 1, 0, 0),
        ],
    )
    .await;

    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Serial, Metric::Print),
    )
    .await
    .unwrap();
    let by_printer = |name: &str| rows.iter().find(|r| r.printer_name == name).unwrap();

    let configured = by_printer("CONFIGURED");
    assert_eq!(configured.group_name, "SRC-SN");
    assert_eq!(configured.brand, "Brother");
    assert_eq!(configured.location, UNDEFINED);

    let agent = by_printer("AGENT-ONLY");
    assert_eq!(agent.group_name, "AG-SN");
    assert_eq!(agent.model, "MFC-L2710");
    assert_eq!(agent.location, "pc-fiscal");
    assert_eq!(agent.brand, "Samsung");

    let bare = by_printer("BARE");
    assert_eq!(bare.group_name, UNDEFINED);
    assert_eq!(bare.model, UNDEFINED);
}

#[tokio::test]
async fn printers_without_window_readings_are_absent() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("OLD", "2026-01-01T09:00:00", 10, 0, 0),
            reading("NOW", "2026-03-10T09:00:00", 10, 0, 0),
        ],
    )
    .await;
    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Printer, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group_name, "NOW");
}

#[tokio::test]
async fn excluded_printers_are_left_out_of_reports() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("LAB", "2026-03-10T09:00:00", 10, 0, 0),
            reading("LAB", "2026-03-10T10:00:00", 90, 0, 0),
            reading("OFFICE", "2026-03-10T09:00:00", 10, 0, 0),
        ],
    )
    .await;
    store.add_exclusion("LAB", "").await.unwrap();

    let rows = report::counter_report(
        &store,
        &query("2026-03-10", "2026-03-10", GroupBy::Printer, Metric::Print),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group_name, "OFFICE");
    assert!(
        report::recent_counter_events(&store, 50)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn daily_totals_clamp_each_component() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-03-10T10:00:00", 100, 50, 0),
            reading("P1", "2026-03-10T11:00:00", 120, 55, 0),
            reading("P1", "2026-03-11T11:00:00", 90, 60, 0),
        ],
    )
    .await;

    let days = report::counter_daily(&store, &Window::default()).await.unwrap();
    let pairs: Vec<_> = days.iter().map(|d| (d.day, d.pages)).collect();
    assert_eq!(
        pairs,
        vec![
            (NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(), 25),
            (NaiveDate::from_ymd_opt(2026, 3, 11).unwrap(), 5),
        ]
    );

    let window = Window::from_params(Some("2026-03-11"), Some("2026-03-11")).unwrap();
    let days = report::counter_daily(&store, &window).await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].pages, 5);
}

#[tokio::test]
async fn daily_totals_seed_from_a_reading_weeks_before_since() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-02-01T10:00:00", 500, 200, 0),
            reading("P1", "2026-02-20T10:00:00", 1000, 300, 0),
            reading("P1", "2026-03-10T10:00:00", 1030, 310, 0),
            reading("P2", "2026-03-10T11:00:00", 40, 0, 0),
        ],
    )
    .await;

    let window = Window::from_params(Some("2026-03-10"), Some("2026-03-10")).unwrap();
    let days = report::counter_daily(&store, &window).await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].pages, 40);
}

#[tokio::test]
async fn recent_events_newest_first() {
    let (_dir, store) = temp_store().await;
    record_all(
        &store,
        &[
            reading("P1", "2026-03-10T10:00:00", 100, 50, 0),
            reading("P1", "2026-03-10T11:00:00", 120, 55, 0),
            reading("P2", "2026-03-10T10:30:00", 10, 0, 0),
            reading("P2", "2026-03-10T12:00:00", 13, 0, 0),
        ],
    )
    .await;
    let events = report::recent_counter_events(&store, 50).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].printer, "P2");
    assert_eq!(events[0].timestamp, ts("2026-03-10T12:00:00"));
    assert_eq!(events[0].pages, 3);
    assert_eq!(events[1].pages, 25);

    let limited = report::recent_counter_events(&store, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn job_printer_readings_resolve_serial_and_sort() {
    let (_dir, store) = temp_store().await;
    let mut src = source("P1", "Brother", "http://10.0.0.9/");
    src.serial = "SRC-SN".into();
    store.upsert_source(&src).await.unwrap();
    store.upsert_printer_model("P2", "M-2070").await.unwrap();

    let job = |at: &str, printer: &str, pages: u64| PrintJob {
        timestamp: ts(at),
        printer: printer.into(),
        pages,
        copies: 1,
    };
    store
        .insert_jobs(&[
            job("2026-03-01T09:00:00", "P1", 10),
            job("2026-03-10T09:00:00", "P1", 5),
            job("2026-03-10T09:00:00", "P2", 40),
            job("2026-03-10T09:00:00", "P3", 1),
        ])
        .await
        .unwrap();

    let window = Window::from_params(Some("2026-03-05"), Some("2026-03-31")).unwrap();
    let rows = report::job_printer_readings(&store, &window).await.unwrap();
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.printer_name.as_str(), r.serial.as_str(), r.difference))
        .collect();
    assert_eq!(
        summary,
        vec![("P2", "M-2070", 40), ("P1", "SRC-SN", 5), ("P3", UNDEFINED, 1)]
    );
    assert_eq!(rows[1].reading_initial, 10);
    assert_eq!(rows[1].reading_final, 15);
}
