//! API error types for the JIRA transport.

use thiserror::Error;

/// Errors that can occur when talking to the JIRA REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid username or token.
    #[error("Authentication failed: check your username and password")]
    Unauthorized,

    /// Permission denied - the account lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the JIRA API.
    #[error("Rate limited by the JIRA server")]
    RateLimited,

    /// JIRA server error or an unexpected status.
    #[error("JIRA server error: {0}")]
    ServerError(String),

    /// Network or HTTP error (DNS, TLS, timeout, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Whether the server rejected the credentials or their permissions.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }
}
