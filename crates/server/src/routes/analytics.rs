use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::ServerState;

/// `GET /analytics/cache` — tier-1/tier-2 hit/miss counters and hit rate.
pub async fn cache_stats(State(state): State<ServerState>) -> Json<Value> {
    Json(serde_json::to_value(state.orchestrator.cache_stats()).unwrap_or(Value::Null))
}

/// `POST /analytics/cache/clear` — flushes both cache tiers.
pub async fn clear_cache(State(state): State<ServerState>) -> Json<Value> {
    state.orchestrator.clear_cache().await;
    Json(json!({ "cleared": true }))
}

/// `GET /analytics/pii` — which sensitive-value kinds are currently enabled.
pub async fn pii_stats(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({ "enabledKinds": state.orchestrator.enabled_detection_kinds() }))
}

/// `GET /analytics/models` — registered model profiles and their rates.
pub async fn model_stats(State(state): State<ServerState>) -> Json<Value> {
    Json(serde_json::to_value(state.orchestrator.model_profiles()).unwrap_or(Value::Null))
}

/// `GET /analytics/summary` — a one-shot combination of the above, for
/// dashboards that would otherwise issue four requests.
pub async fn summary(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "cache": state.orchestrator.cache_stats(),
        "enabledPiiKinds": state.orchestrator.enabled_detection_kinds(),
        "models": state.orchestrator.model_profiles(),
    }))
}

/// `GET /analytics/health` — cache backend reachability, separate from the
/// plain liveness probe at `/health`.
pub async fn health(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({ "cacheHealthy": state.orchestrator.cache_health_check().await }))
}
