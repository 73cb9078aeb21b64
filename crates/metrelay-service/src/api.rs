//! HTTP/JSON handlers.
//!
//! Every mutation endpoint accepts `{name, value?, labels?}`, resolves the
//! metric through the framework (which normalizes the name and validates
//! labels), and maps error codes onto HTTP statuses: 404 for unknown
//! metrics, 400 for validation and operation errors, 202 when a push
//! reaches the handler but transport fails.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use metrelay_core::error::{ErrorCode, MetrelayError};
use metrelay_core::LabelSet;

use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetricRequest {
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub labels: LabelSet,
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub gateway_url: String,
    pub job_name: String,
}

type ApiResponse = (StatusCode, Json<Value>);

fn success() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "status": "success" })))
}

fn failure(err: &MetrelayError) -> ApiResponse {
    let status = match err.code() {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Transport => StatusCode::ACCEPTED,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(json!({
            "status": "error",
            "code": err.code().as_str(),
            "message": err.to_string(),
        })),
    )
}

fn respond(result: metrelay_core::Result<()>) -> ApiResponse {
    match result {
        Ok(()) => success(),
        Err(e) => failure(&e),
    }
}

/// POST /register: drop every registered metric, then re-register the
/// whole catalog.
pub async fn register(State(state): State<AppState>) -> ApiResponse {
    let fw = state.framework();
    for name in fw.list_metrics() {
        if let Err(e) = fw.unregister_metric(&name) {
            tracing::warn!(%name, error = %e, "unregister failed");
        }
    }
    respond(fw.register_all())
}

/// POST /increment
pub async fn increment(
    State(state): State<AppState>,
    Json(req): Json<MetricRequest>,
) -> ApiResponse {
    tracing::debug!(name = %req.name, "increment");
    respond(state.framework().increment(&req.name, &req.labels))
}

/// POST /decrement
pub async fn decrement(
    State(state): State<AppState>,
    Json(req): Json<MetricRequest>,
) -> ApiResponse {
    tracing::debug!(name = %req.name, "decrement");
    respond(state.framework().decrement(&req.name, &req.labels))
}

/// POST /add
pub async fn add(State(state): State<AppState>, Json(req): Json<MetricRequest>) -> ApiResponse {
    tracing::debug!(name = %req.name, value = req.value, "add");
    respond(state.framework().add_to(&req.name, req.value, &req.labels))
}

/// POST /set
pub async fn set(State(state): State<AppState>, Json(req): Json<MetricRequest>) -> ApiResponse {
    tracing::debug!(name = %req.name, value = req.value, "set");
    respond(state.framework().set(&req.name, req.value, &req.labels))
}

/// POST /push: the gateway flush blocks on the network, so it runs on the
/// blocking pool. A transport failure is reported as 202: the metrics were
/// collected, delivery was not confirmed.
pub async fn push(State(state): State<AppState>, Json(req): Json<PushRequest>) -> ApiResponse {
    let fw = state.framework();
    let outcome =
        tokio::task::spawn_blocking(move || fw.push_metrics(&req.gateway_url, &req.job_name))
            .await;

    match outcome {
        Ok(Ok(())) => success(),
        Ok(Err(e @ MetrelayError::Transport(_))) => {
            tracing::warn!(error = %e, "push to gateway failed");
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "status": "accepted",
                    "message": "metrics collected but push failed",
                })),
            )
        }
        Ok(Err(e)) => failure(&e),
        Err(e) => {
            tracing::error!(error = %e, "push task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "internal server error" })),
            )
        }
    }
}

/// GET /list
pub async fn list(State(state): State<AppState>) -> ApiResponse {
    let metrics = state.framework().list_metrics();
    (
        StatusCode::OK,
        Json(json!({ "count": metrics.len(), "metrics": metrics })),
    )
}

/// GET /debug: per-metric kind and status.
pub async fn debug(State(state): State<AppState>) -> ApiResponse {
    let fw = state.framework();
    let mut details = serde_json::Map::new();
    for name in fw.list_metrics() {
        let entry = match fw.get_metric(&name) {
            Ok(metric) => json!({ "type": metric.kind().as_str(), "status": "ok" }),
            Err(e) => json!({ "status": "error", "error": e.to_string() }),
        };
        details.insert(name, entry);
    }
    (StatusCode::OK, Json(Value::Object(details)))
}
