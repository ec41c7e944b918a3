//! Configuration management for jira-export.
//!
//! Connection settings are read from the environment (optionally seeded from a
//! `.env` file) and validated once at startup.

mod settings;

use thiserror::Error;

pub use settings::{ConnectionSettings, DEFAULT_PAGE_SIZE, REDACTED};

/// Errors raised while building connection settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting was empty or not set.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The page size was not a positive integer.
    #[error("Batch size must be a positive integer, got {0}")]
    InvalidBatchSize(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
