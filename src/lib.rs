//! jira-export - fetch JIRA issues and changelogs as tables.
//!
//! The library pages through JQL search results and issue histories and
//! flattens them into [`ResultTable`]s that can be written as CSV, JSON, or
//! XLSX, or rendered in the terminal.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod logging;
pub mod table;

pub use api::{IssueSource, JiraSession};
pub use config::{ConfigError, ConnectionSettings};
pub use error::ToolError;
pub use export::OutputFormat;
pub use fetch::{ChangelogFetcher, IssueFetcher};
pub use table::ResultTable;
