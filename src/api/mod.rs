//! JIRA API client and types.
//!
//! This module provides the interface for communicating with the JIRA REST API.

mod auth;
mod client;
pub mod error;
mod session;
pub mod types;

pub use auth::Auth;
pub use client::JiraClient;
pub use error::ApiError;
pub use session::{IssueSource, JiraSession};
pub use types::{Changelog, History, HistoryItem, Issue, IssueFields, SearchResult, ServerInfo};
