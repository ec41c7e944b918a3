//! Centralized error types for jira-export.
//!
//! Every failure the command line reports comes through [`ToolError`]. The
//! per-concern enums (`ConfigError`, `ApiError`, `ExportError`) keep their
//! own detail and are wrapped here.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::export::ExportError;

/// The main tool error type.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Invalid or missing settings.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The server rejected the credentials or their permissions.
    #[error("{0}")]
    Authentication(String),

    /// The server could not be reached at connect time.
    #[error("{0}")]
    Connection(String),

    /// A search or issue lookup failed inside a fetch routine.
    #[error("{message}: {source}")]
    Fetch {
        /// What was being fetched.
        message: String,
        /// The underlying failure.
        #[source]
        source: Box<ToolError>,
    },

    /// A transport failure outside of connect.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Writing the result table failed.
    #[error("{0}")]
    Export(#[from] ExportError),
}

impl ToolError {
    /// Wrap a failure that happened while fetching.
    pub fn fetch(message: impl Into<String>, source: ToolError) -> Self {
        ToolError::Fetch {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Classify a failure of the connect-time probe.
    ///
    /// Unauthorized and forbidden responses become [`ToolError::Authentication`];
    /// anything else becomes [`ToolError::Connection`].
    pub fn from_connect(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => ToolError::Authentication(
                "Authentication failed. Please check your username and password.".to_string(),
            ),
            ApiError::Forbidden => ToolError::Authentication(
                "Access forbidden. Please check your account permissions.".to_string(),
            ),
            other => ToolError::Connection(format!("Failed to connect to JIRA: {}", other)),
        }
    }
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
