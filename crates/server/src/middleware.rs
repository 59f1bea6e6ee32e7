use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::ServerState;

const API_KEY_HEADER: &str = "x-api-key";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rejects requests without a recognized `X-API-Key` header before they
/// reach routing. `/health` is mounted outside this layer.
pub async fn api_key_auth(State(state): State<ServerState>, request: Request, next: Next) -> Result<Response, ServerError> {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;

    if !state.is_valid_api_key(key) {
        return Err(ServerError::Unauthorized);
    }

    if !state.check_rate_limit(key) {
        return Err(ServerError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Stamps every response with an `X-Request-Id`, generating one if the
/// caller didn't supply it.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.headers_mut().insert(REQUEST_ID_HEADER, HeaderValue::from_str(&incoming).unwrap_or_else(|_| HeaderValue::from_static("invalid")));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&incoming) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Logs method, path, status, and latency for every request at `info`.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = std::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let millis = started_at.elapsed().as_millis();
    if status.is_server_error() {
        tracing::error!(%method, %path, %status, millis, "request completed");
    } else if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::UNAUTHORIZED {
        tracing::warn!(%method, %path, %status, millis, "request completed");
    } else {
        tracing::info!(%method, %path, %status, millis, "request completed");
    }
    response
}
