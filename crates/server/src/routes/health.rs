use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::ServerState;

/// `GET /health` — liveness only, mounted outside the auth layer.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /health/ready` — liveness plus a cache backend round-trip.
pub async fn readiness_check(State(state): State<ServerState>) -> (StatusCode, Json<Value>) {
    let cache_healthy = state.orchestrator.cache_health_check().await;
    let status = if cache_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(json!({ "status": if cache_healthy { "ready" } else { "degraded" }, "cache": cache_healthy })))
}

/// `GET /` — static build/version metadata.
pub async fn server_metadata(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "name": "llmguardian",
        "version": state.config.version,
    }))
}

/// `GET /api/v1` — summarizes the authenticated API surface.
pub async fn api_info() -> Json<Value> {
    Json(json!({
        "endpoints": [
            "POST /api/v1/completions",
            "GET /analytics/cache",
            "GET /analytics/pii",
            "GET /analytics/models",
            "GET /analytics/summary",
            "GET /analytics/health",
            "POST /analytics/cache/clear",
        ]
    }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": { "code": "NOT_FOUND", "message": "no such route" } })))
}
