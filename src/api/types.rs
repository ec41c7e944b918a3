//! JIRA API response types.
//!
//! These types model the JIRA REST API v2 responses for server info, search
//! results, and issues with their changelog. Issue fields are kept as raw JSON
//! so that a field with an unexpected shape only affects that one field.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Server metadata.
///
/// Returned by `GET /rest/api/2/serverInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// The server version (e.g., "9.12.2").
    #[serde(default)]
    pub version: Option<String>,
    /// The base URL the server reports for itself.
    #[serde(default)]
    pub base_url: Option<String>,
    /// The server title.
    #[serde(default)]
    pub server_title: Option<String>,
    /// "Cloud" or "Server".
    #[serde(default)]
    pub deployment_type: Option<String>,
}

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/2/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index of the first result.
    #[serde(default)]
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching issues.
    #[serde(default)]
    pub total: u32,
    /// The page of issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// A JIRA issue as returned by search or `GET /rest/api/2/issue/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// The issue ID.
    #[serde(default)]
    pub id: Option<String>,
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// The issue fields, as sent by the server.
    #[serde(default)]
    pub fields: IssueFields,
    /// The change history, present only when expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
}

impl Issue {
    /// Create an issue with just a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            fields: IssueFields::default(),
            changelog: None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// The raw `fields` object of an issue.
///
/// Offers a typed accessor for fields with a known shape and a generic lookup
/// for everything else. Neither fails because a field is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueFields(Map<String, Value>);

impl IssueFields {
    /// Look up a field by name. JSON `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// Deserialize a field into `T`.
    ///
    /// Returns `Ok(None)` when the field is absent or null, and an error only
    /// when the field is present with a shape `T` cannot represent.
    pub fn typed<T: DeserializeOwned>(&self, name: &str) -> serde_json::Result<Option<T>> {
        self.get(name)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }
}

impl From<Map<String, Value>> for IssueFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A JIRA user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// The login name (Server/Data Center).
    #[serde(default)]
    pub name: Option<String>,
    /// The account ID (Cloud).
    #[serde(default)]
    pub account_id: Option<String>,
    /// The user's email address (may be hidden).
    #[serde(default)]
    pub email_address: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self
            .display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.account_id.as_deref())
            .unwrap_or_default();
        write!(f, "{}", label)
    }
}

/// Issue status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// The status name (e.g., "Open", "In Progress", "Done").
    pub name: String,
    /// The status description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Issue type (Bug, Story, Task, Epic, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueType {
    /// The issue type name.
    pub name: String,
    /// Whether this is a subtask type.
    #[serde(default)]
    pub subtask: bool,
}

/// Issue priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Priority {
    /// The priority name (e.g., "High").
    pub name: String,
}

/// Issue resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// The resolution name (e.g., "Fixed").
    pub name: String,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A project component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// The component name.
    pub name: String,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A project version, as used by `fixVersions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// The version name.
    pub name: String,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The expanded change history of an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changelog {
    /// History entries, oldest first.
    #[serde(default)]
    pub histories: Vec<History>,
}

/// One history entry: a set of fields changed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    /// The entry ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Who made the change. Absent for automated changes.
    #[serde(default)]
    pub author: Option<User>,
    /// When the change was made, as sent by the server.
    #[serde(default)]
    pub created: Option<String>,
    /// The individual field changes.
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

/// A single field change within a history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// The field name.
    #[serde(default)]
    pub field: Option<String>,
    /// "jira" for system fields, "custom" for custom fields.
    #[serde(default, rename = "fieldtype")]
    pub field_type: Option<String>,
    /// The raw previous value (often an ID).
    #[serde(default)]
    pub from: Value,
    /// The previous value for display.
    #[serde(default)]
    pub from_string: Option<String>,
    /// The raw new value (often an ID).
    #[serde(default)]
    pub to: Value,
    /// The new value for display.
    #[serde(default)]
    pub to_string: Option<String>,
}
