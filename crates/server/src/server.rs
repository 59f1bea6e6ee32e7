use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{analytics, completions, health};
use crate::state::ServerState;

/// Builds the full router: a public `/health*` surface plus an
/// auth-and-rate-limited `/api/v1/*` and `/analytics/*` surface, wrapped in
/// the ambient HTTP middleware stack.
pub fn build_router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/api/v1", get(health::api_info))
        .route("/api/v1/completions", post(completions::complete))
        .route("/analytics/cache", get(analytics::cache_stats))
        .route("/analytics/cache/clear", post(analytics::clear_cache))
        .route("/analytics/pii", get(analytics::pii_stats))
        .route("/analytics/models", get(analytics::model_stats))
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/health", get(analytics::health))
        .layer(axum_middleware::from_fn_with_state(state.clone(), api_key_auth));

    let public = Router::new()
        .route("/", get(health::server_metadata))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(health::not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TimeoutLayer::new(state.config.timeout()))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(log_requests))
        .layer(axum_middleware::from_fn(request_id))
        .with_state(state)
}

/// Binds and serves until SIGTERM/Ctrl+C, draining in-flight audit writes
/// before returning.
pub async fn start_server(config: Arc<ServerConfig>, state: ServerState) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let router = build_router(state);

    tracing::info!(%addr, "starting llmguardian server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
    let _ = Duration::from_secs(0);
}
