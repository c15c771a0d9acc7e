//! Provider-specific error types
//!
//! ProviderError는 completion 서비스 관련 세부 에러를 관리합니다.
//! skillflow_foundation::Error와의 변환을 지원합니다.
//! 이 레이어는 재시도하지 않습니다.

use skillflow_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur while talking to the completion service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// API key is missing or invalid
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Context length exceeded
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network error (connection failed, DNS, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid request (bad parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found or not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider not configured
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => ProviderError::RateLimited(body.to_string()),
            400 => {
                if body.contains("context") || body.contains("too long") || body.contains("token") {
                    ProviderError::ContextLengthExceeded(body.to_string())
                } else {
                    ProviderError::InvalidRequest(body.to_string())
                }
            }
            404 => ProviderError::ModelNotAvailable(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }
}

// ============================================================================
// skillflow_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(msg) => FoundationError::Http(format!("Network: {}", msg)),
            ProviderError::InvalidRequest(msg) => FoundationError::InvalidInput(msg),
            ProviderError::NotConfigured(msg) => FoundationError::Config(msg),
            other => FoundationError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            ProviderError::from_http_status(401, "bad key"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(400, "maximum context length"),
            ProviderError::ContextLengthExceeded(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "overloaded"),
            ProviderError::ServerError(_)
        ));
        assert_eq!(
            ProviderError::from_http_status(418, "teapot"),
            ProviderError::Unknown("HTTP 418: teapot".to_string())
        );
    }

    #[test]
    fn test_into_foundation_error() {
        let err: FoundationError = ProviderError::ServerError("down".into()).into();
        assert!(matches!(err, FoundationError::Provider(msg) if msg.contains("down")));

        let err: FoundationError = ProviderError::NotConfigured("no key".into()).into();
        assert!(matches!(err, FoundationError::Config(_)));
    }
}
