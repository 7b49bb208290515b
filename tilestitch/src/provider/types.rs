//! Provider error types

use thiserror::Error;

/// Errors that can occur at the HTTP transport layer.
///
/// Non-success HTTP statuses are not errors at this layer; they are reported
/// through [`HttpResponse`](super::HttpResponse) so callers can decide whether
/// to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request could not be sent or its body could not be read
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
    /// Response body was not what the caller expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Returns true if the error came from a timed-out request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_http_error() {
        let err = ProviderError::HttpError("connection refused".to_string());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn test_display_other_variants() {
        assert_eq!(
            ProviderError::Timeout("30s".to_string()).to_string(),
            "Request timed out: 30s"
        );
        assert_eq!(
            ProviderError::ClientBuild("tls".to_string()).to_string(),
            "Failed to create HTTP client: tls"
        );
        assert_eq!(
            ProviderError::InvalidResponse("empty".to_string()).to_string(),
            "Invalid response: empty"
        );
    }

    #[test]
    fn test_is_timeout() {
        assert!(ProviderError::Timeout("30s".to_string()).is_timeout());
        assert!(!ProviderError::HttpError("x".to_string()).is_timeout());
    }
}
