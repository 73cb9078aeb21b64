#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

//! End-to-end HTTP flows against a real listener.

use serde_json::{json, Value};

use metrelay_service::{app_state::AppState, config, router};

const CATALOG: &str = r#"[
    {
        "name": "cpu_usage",
        "displayName": "CPU Usage (Percent)",
        "description": "CPU usage of the node",
        "object": ["node"],
        "metric_kind": "Gauge"
    },
    {
        "name": "ho_attempts",
        "displayName": "Handover Attempts",
        "description": "Total handover attempts",
        "object": ["node"],
        "metric_kind": "Counter",
        "increment": true
    },
    {
        "name": "active_ues",
        "displayName": "Active UEs",
        "description": "Currently attached UEs",
        "object": [],
        "metric_kind": "Gauge"
    }
]"#;

fn write_catalog(tag: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "metrelay-http-api-{}-{tag}.json",
        std::process::id()
    ));
    std::fs::write(&path, CATALOG).unwrap();
    path.to_string_lossy().into_owned()
}

/// Spin the service up on an ephemeral port, return its base URL.
async fn spawn_app(tag: &str) -> String {
    let catalog_path = write_catalog(tag);
    let yaml = format!(
        "version: 1\nmetrics:\n  backend: \"prometheus\"\n  catalog: \"{catalog_path}\"\n"
    );
    let cfg = config::load_from_str(&yaml).unwrap();
    let state = AppState::new(&cfg).unwrap();
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn register_and_list() {
    let base = spawn_app("register").await;

    let (status, body) = post(&base, "/register", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");

    let (status, body) = get(&base, "/list").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 3);
    let names: Vec<&str> = body["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(names.contains(&"cpu_usage_percent"));
    assert!(names.contains(&"handover_attempts"));
    assert!(names.contains(&"active_ues"));
}

#[tokio::test]
async fn increment_unknown_metric_is_404() {
    let base = spawn_app("unknown").await;
    let (status, body) = post(
        &base,
        "/increment",
        json!({ "name": "No Such KPI", "labels": {} }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn increment_without_required_label_is_400() {
    let base = spawn_app("nolabel").await;
    let (status, body) = post(
        &base,
        "/increment",
        json!({ "name": "Handover Attempts", "labels": {} }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "MISSING_LABEL");
}

#[tokio::test]
async fn increment_with_labels_succeeds() {
    let base = spawn_app("inc").await;
    let (status, body) = post(
        &base,
        "/increment",
        json!({ "name": "Handover Attempts", "labels": { "node": "gnb-1" } }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn set_on_counter_is_400() {
    let base = spawn_app("setcounter").await;
    let (status, body) = post(
        &base,
        "/set",
        json!({ "name": "Handover Attempts", "value": 7.0, "labels": { "node": "gnb-1" } }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_OPERATION");
}

#[tokio::test]
async fn gauge_add_and_decrement() {
    let base = spawn_app("gauge").await;

    let (status, _) = post(
        &base,
        "/add",
        json!({ "name": "Active UEs", "value": 5.0, "labels": {} }),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = post(&base, "/decrement", json!({ "name": "Active UEs", "labels": {} }))
        .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn push_to_unreachable_gateway_is_202() {
    let base = spawn_app("push").await;
    let (status, body) = post(
        &base,
        "/push",
        json!({ "gateway_url": "http://127.0.0.1:9", "job_name": "metrelay-test" }),
    )
    .await;
    assert_eq!(status, 202);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn debug_reports_kind_per_metric() {
    let base = spawn_app("debug").await;
    let (status, body) = get(&base, "/debug").await;
    assert_eq!(status, 200);
    assert_eq!(body["handover_attempts"]["type"], "Counter");
    assert_eq!(body["handover_attempts"]["status"], "ok");
    assert_eq!(body["cpu_usage_percent"]["type"], "Gauge");
}
