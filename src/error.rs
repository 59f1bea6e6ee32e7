use provider::ProviderErrorKind;

/// Closed error-kind set recognized across the core. `validation` maps to
/// 400; every `provider-*` kind collapses to 500 with `errorType =
/// "PROVIDER_ERROR"` after retries are exhausted; `cache-io` and `audit-io`
/// never reach here — they're logged and treated as a miss/no-op at the
/// call site; anything else collapses to `internal`.
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider authentication error: {0}")]
    ProviderAuth(String),

    #[error("provider rate limit: {0}")]
    ProviderRateLimit(String),

    #[error("provider invalid request: {0}")]
    ProviderInvalidRequest(String),

    #[error("provider resource not found: {0}")]
    ProviderNotFound(String),

    #[error("provider server error: {0}")]
    ProviderServer(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider timeout: {0}")]
    ProviderTimeout(String),

    #[error("provider connection error: {0}")]
    ProviderConnection(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GuardianError {
    /// Stable, machine-readable error type surfaced in HTTP responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            GuardianError::Validation(_) => "VALIDATION_ERROR",
            GuardianError::ProviderAuth(_)
            | GuardianError::ProviderRateLimit(_)
            | GuardianError::ProviderInvalidRequest(_)
            | GuardianError::ProviderNotFound(_)
            | GuardianError::ProviderServer(_)
            | GuardianError::ProviderUnavailable(_)
            | GuardianError::ProviderTimeout(_)
            | GuardianError::ProviderConnection(_) => "PROVIDER_ERROR",
            GuardianError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short, human-readable message safe to surface to a caller: never a
    /// stack trace, never the original query, never a sensitive value.
    pub fn user_message(&self) -> String {
        match self {
            GuardianError::Validation(message) => message.clone(),
            GuardianError::Internal(_) => "an internal error occurred".to_string(),
            _ => "the upstream model provider failed to complete this request".to_string(),
        }
    }
}

impl From<provider::ProviderError> for GuardianError {
    fn from(error: provider::ProviderError) -> Self {
        let message = error.message.clone();
        match error.kind {
            ProviderErrorKind::Authentication => GuardianError::ProviderAuth(message),
            ProviderErrorKind::RateLimit => GuardianError::ProviderRateLimit(message),
            ProviderErrorKind::InvalidRequest => GuardianError::ProviderInvalidRequest(message),
            ProviderErrorKind::NotFound => GuardianError::ProviderNotFound(message),
            ProviderErrorKind::ServerError => GuardianError::ProviderServer(message),
            ProviderErrorKind::ServiceUnavailable => GuardianError::ProviderUnavailable(message),
            ProviderErrorKind::Timeout => GuardianError::ProviderTimeout(message),
            ProviderErrorKind::Connection => GuardianError::ProviderConnection(message),
            ProviderErrorKind::Unknown => GuardianError::Internal(message),
        }
    }
}
