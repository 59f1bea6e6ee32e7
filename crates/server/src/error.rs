use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wraps `GuardianError` and the ambient HTTP-layer failures (bad auth, rate
/// limiting, body-size limits) into the one error type that turns into an
/// HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Guardian(#[from] llmguardian::GuardianError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("invalid listen address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Guardian(error) => match error.error_type() {
                "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Io(_) | ServerError::Json(_) | ServerError::Anyhow(_) | ServerError::AddrParse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "VALIDATION_ERROR",
            ServerError::Guardian(error) => error.error_type(),
            ServerError::Unauthorized => "UNAUTHORIZED",
            ServerError::RateLimited => "RATE_LIMITED",
            ServerError::Io(_) => "IO_ERROR",
            ServerError::Json(_) => "JSON_ERROR",
            ServerError::Anyhow(_) => "INTERNAL_ERROR",
            ServerError::AddrParse(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(ServerError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(ServerError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn guardian_validation_error_maps_to_400() {
        let error = ServerError::Guardian(llmguardian::GuardianError::Validation("bad".to_string()));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn guardian_provider_error_maps_to_500() {
        let error = ServerError::Guardian(llmguardian::GuardianError::Internal("boom".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
