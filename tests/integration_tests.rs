// Integration tests: JSON HTTP endpoints

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use common::{BROTHER_PAGE, reading, record_all, source, temp_store};
use printwatch::fetcher::{CounterFetcher, RetryPolicy};
use printwatch::poller::{PollScheduler, PollerConfig};
use printwatch::routes;
use printwatch::store::CounterStore;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_server() -> (TempDir, Arc<CounterStore>, TestServer) {
    let (dir, store) = temp_store().await;
    let store = Arc::new(store);
    let fetcher = CounterFetcher::new(RetryPolicy::default()).unwrap();
    let scheduler = Arc::new(PollScheduler::new(
        store.clone(),
        fetcher,
        PollerConfig {
            interval: Duration::from_secs(300),
            poll_timeout: Duration::from_secs(10),
            concurrency: 4,
        },
    ));
    let server = TestServer::new(routes::app(store.clone(), scheduler));
    (dir, store, server)
}

async fn seed_counters(store: &CounterStore) {
    record_all(
        store,
        &[
            reading("P1", "2026-03-09T12:00:00", 150, 40, 0),
            reading("P1", "2026-03-10T12:00:00", 160, 45, 0),
            reading("P2", "2026-03-09T12:00:00", 10, 0, 0),
            reading("P2", "2026-03-10T12:00:00", 70, 0, 0),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_version_endpoint() {
    let (_dir, _store, server) = test_server().await;
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("printwatch")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_counter_report_endpoint() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;

    let response = server
        .get("/api/counter-report")
        .add_query_param("since", "2026-03-10")
        .add_query_param("until", "2026-03-10")
        .await;
    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["group_name"], "P2");
    assert_eq!(rows[0]["difference"], 60);
    assert_eq!(rows[0]["metric"], "print");
    assert_eq!(rows[1]["group_name"], "P1");
    assert_eq!(rows[1]["difference"], 10);
}

#[tokio::test]
async fn test_counter_report_unknown_group_and_metric_fall_back() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;

    let response = server
        .get("/api/counter-report")
        .add_query_param("since", "2026-03-10")
        .add_query_param("group_by", "department")
        .add_query_param("metric", "copy")
        .await;
    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    assert_eq!(rows[0]["group_name"], "P1");
    assert_eq!(rows[0]["difference"], 5);
    assert_eq!(rows[0]["metric"], "copy");
}

#[tokio::test]
async fn test_invalid_date_is_bad_request() {
    let (_dir, _store, server) = test_server().await;
    let response = server
        .get("/api/counter-daily")
        .add_query_param("since", "last tuesday")
        .await;
    response.assert_status_bad_request();
    let json: serde_json::Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("last tuesday"));
}

#[tokio::test]
async fn test_counter_daily_and_events_endpoints() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;

    let response = server.get("/api/counter-daily").await;
    response.assert_status_ok();
    let days: serde_json::Value = response.json();
    assert_eq!(days[0]["day"], "2026-03-09");
    assert_eq!(days[0]["pages"], 0);
    assert_eq!(days[1]["day"], "2026-03-10");
    assert_eq!(days[1]["pages"], 75);

    let response = server
        .get("/api/counter-events")
        .add_query_param("limit", "1")
        .await;
    response.assert_status_ok();
    let events: serde_json::Value = response.json();
    assert_eq!(events.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_printer_counters_endpoint() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;
    let response = server.get("/api/printer-counters").await;
    response.assert_status_ok();
    let latest: serde_json::Value = response.json();
    assert_eq!(latest[0]["printer_name"], "P1");
    assert_eq!(latest[0]["total_print"], 160);
    assert_eq!(latest[1]["total_print"], 70);
}

#[tokio::test]
async fn test_job_printer_readings_endpoint_is_empty_without_jobs() {
    let (_dir, _store, server) = test_server().await;
    let response = server.get("/api/job-printer-readings").await;
    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    assert!(rows.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_and_test_source_endpoints() {
    let printer = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BROTHER_PAGE))
        .mount(&printer)
        .await;

    let (_dir, store, server) = test_server().await;
    let id = store
        .upsert_source(&source("Brother-90", "Brother", &printer.uri()))
        .await
        .unwrap();

    let response = server.get("/api/printer-sources").await;
    response.assert_status_ok();
    let sources: serde_json::Value = response.json();
    assert_eq!(sources[0]["name"], "Brother-90");

    let response = server.post("/api/printer-scan").await;
    response.assert_status_ok();
    let scan: serde_json::Value = response.json();
    assert_eq!(scan["ok"], true);
    assert_eq!(scan["results"][0]["ok"], true);
    assert_eq!(scan["results"][0]["counters"]["print"], 35_870);

    let response = server.post(&format!("/api/printer-sources/{id}/test")).await;
    response.assert_status_ok();
    let outcome: serde_json::Value = response.json();
    assert_eq!(outcome["printer"], "Brother-90");
    assert_eq!(store.count_readings().await.unwrap(), 2);

    let response = server.post("/api/printer-sources/9999/test").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_agent_heartbeat_registers_agent_and_model() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;

    let response = server
        .post("/api/agents/heartbeat")
        .json(&serde_json::json!({
            "host": "PC-07",
            "printer_name": "P1",
            "printer_model": "M404",
            "printer_serial": "SN-77",
            "agent_version": "1.4.0"
        }))
        .await;
    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["ok"], true);

    let agents: serde_json::Value = server.get("/api/agents").await.json();
    assert_eq!(agents[0]["agent_id"], "PC-07|P1");
    assert_eq!(agents[0]["version"], "1.4.0");

    let rows: serde_json::Value = server
        .get("/api/counter-report")
        .add_query_param("since", "2026-03-10")
        .await
        .json();
    let p1 = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["group_name"] == "P1")
        .unwrap();
    assert_eq!(p1["model"], "M404");
    assert_eq!(p1["serial"], "SN-77");

    let response = server
        .post("/api/agents/heartbeat")
        .json(&serde_json::json!({ "agent_id": "a-1", "printer_name": "P1" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_client_jobs_feed_job_printer_readings() {
    let (_dir, _store, server) = test_server().await;

    let response = server
        .post("/api/client-jobs")
        .json(&serde_json::json!([
            {
                "submitted": "2026-03-10T09:00:00",
                "printer": "HP-Fin",
                "pages": 3,
                "copies": 2,
                "client_host": "PC-07",
                "printer_serial": "SN-9"
            },
            { "timestamp": "2026-03-10T10:00:00", "printer": "HP-Fin", "pages": 4 }
        ]))
        .await;
    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["inserted"], 2);

    let rows: serde_json::Value = server.get("/api/job-printer-readings").await.json();
    assert_eq!(rows[0]["printer_name"], "HP-Fin");
    assert_eq!(rows[0]["serial"], "SN-9");
    assert_eq!(rows[0]["difference"], 10);

    let agents: serde_json::Value = server.get("/api/agents").await.json();
    assert_eq!(agents.as_array().unwrap().len(), 1);

    let response = server
        .post("/api/client-jobs")
        .json(&serde_json::json!([
            { "timestamp": "2026-03-10T10:00:00", "printer": "  ", "pages": 4 }
        ]))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_printer_model_override_endpoint() {
    let (_dir, _store, server) = test_server().await;

    server
        .post("/api/printer-models")
        .json(&serde_json::json!({ "printer": "P9", "model": "X-1" }))
        .await
        .assert_status_ok();
    server
        .post("/api/client-jobs")
        .json(&serde_json::json!([
            { "timestamp": "2026-03-10T10:00:00", "printer": "P9", "pages": 1 }
        ]))
        .await
        .assert_status_ok();

    let rows: serde_json::Value = server.get("/api/job-printer-readings").await.json();
    assert_eq!(rows[0]["serial"], "X-1");

    server
        .post("/api/printer-models")
        .json(&serde_json::json!({ "printer": "P9", "model": "" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_exclusions_add_list_and_remove() {
    let (_dir, store, server) = test_server().await;
    seed_counters(&store).await;

    server
        .post("/api/exclusions")
        .json(&serde_json::json!({ "printer": "P2", "note": "test bench" }))
        .await
        .assert_status_ok();
    let names: serde_json::Value = server.get("/api/exclusions").await.json();
    assert_eq!(names, serde_json::json!(["P2"]));

    let rows: serde_json::Value = server
        .get("/api/counter-report")
        .add_query_param("since", "2026-03-10")
        .await
        .json();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["group_name"], "P1");

    let response = server
        .delete("/api/exclusions")
        .add_query_param("printer", "P2")
        .await;
    response.assert_status_ok();
    let ack: serde_json::Value = response.json();
    assert_eq!(ack["removed"], true);
    let names: serde_json::Value = server.get("/api/exclusions").await.json();
    assert!(names.as_array().unwrap().is_empty());

    server
        .post("/api/exclusions")
        .json(&serde_json::json!({ "printer": " " }))
        .await
        .assert_status_bad_request();
}
