use serde::{Deserialize, Serialize};

/// Closed error-classification set. Every failure from a provider call is
/// bucketed into exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimit,
    InvalidRequest,
    NotFound,
    ServerError,
    ServiceUnavailable,
    Timeout,
    Connection,
    Unknown,
}

impl ProviderErrorKind {
    /// Rate-limit, server-error, service-unavailable, timeout, connection are
    /// retryable; everything else is not.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimit
                | ProviderErrorKind::ServerError
                | ProviderErrorKind::ServiceUnavailable
                | ProviderErrorKind::Timeout
                | ProviderErrorKind::Connection
        )
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ProviderErrorKind::Authentication,
            404 => ProviderErrorKind::NotFound,
            400 | 422 => ProviderErrorKind::InvalidRequest,
            429 => ProviderErrorKind::RateLimit,
            503 => ProviderErrorKind::ServiceUnavailable,
            500..=599 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("provider error ({kind:?}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            ProviderErrorKind::Timeout
        } else if error.is_connect() {
            ProviderErrorKind::Connection
        } else if let Some(status) = error.status() {
            ProviderErrorKind::from_status(status.as_u16())
        } else {
            ProviderErrorKind::Unknown
        };
        ProviderError::new(kind, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds_match_spec_closed_set() {
        assert!(ProviderErrorKind::RateLimit.is_retryable());
        assert!(ProviderErrorKind::ServerError.is_retryable());
        assert!(ProviderErrorKind::ServiceUnavailable.is_retryable());
        assert!(ProviderErrorKind::Timeout.is_retryable());
        assert!(ProviderErrorKind::Connection.is_retryable());
        assert!(!ProviderErrorKind::Authentication.is_retryable());
        assert!(!ProviderErrorKind::InvalidRequest.is_retryable());
        assert!(!ProviderErrorKind::NotFound.is_retryable());
        assert!(!ProviderErrorKind::Unknown.is_retryable());
    }

    #[test]
    fn status_codes_classify_as_expected() {
        assert_eq!(ProviderErrorKind::from_status(401), ProviderErrorKind::Authentication);
        assert_eq!(ProviderErrorKind::from_status(429), ProviderErrorKind::RateLimit);
        assert_eq!(ProviderErrorKind::from_status(503), ProviderErrorKind::ServiceUnavailable);
        assert_eq!(ProviderErrorKind::from_status(500), ProviderErrorKind::ServerError);
        assert_eq!(ProviderErrorKind::from_status(404), ProviderErrorKind::NotFound);
    }
}
