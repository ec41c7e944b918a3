//! Flattening issue fields into record values.

use serde_json::Value;
use tracing::debug;

use crate::api::types::{Component, IssueType, Priority, Resolution, Status, User, Version};
use crate::api::Issue;

/// Fields extracted when the caller does not ask for specific ones.
pub const DEFAULT_FIELDS: [&str; 15] = [
    "key",
    "assignee",
    "creator",
    "reporter",
    "created",
    "components",
    "description",
    "summary",
    "fixVersions",
    "issuetype",
    "priority",
    "resolution",
    "resolutiondate",
    "status",
    "updated",
];

/// One flattened issue: requested field names with their values, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    values: Vec<(String, Value)>,
}

impl IssueRecord {
    /// Extract `fields` from `issue`.
    ///
    /// A field that cannot be extracted is logged and stored as `null`; the
    /// rest of the record is still filled in.
    pub fn extract<S: AsRef<str>>(issue: &Issue, fields: &[S]) -> Self {
        let values = fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                let value = field_value(issue, field).unwrap_or_else(|e| {
                    debug!("Could not extract field '{}' from {}: {}", field, issue.key, e);
                    Value::Null
                });
                (field.to_string(), value)
            })
            .collect();

        Self { values }
    }

    /// Value of a field, if it was requested.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Consume the record into cells, in field order.
    pub fn into_cells(self) -> Vec<Value> {
        self.values.into_iter().map(|(_, value)| value).collect()
    }
}

/// Look up one field using its extraction rule, falling back to the raw value.
///
/// Absent fields yield `null`. An error is returned only when a field with a
/// known shape is present but malformed.
pub fn field_value(issue: &Issue, field: &str) -> serde_json::Result<Value> {
    let fields = &issue.fields;

    let value = match field {
        "key" => Value::String(issue.key.clone()),
        "assignee" | "creator" | "reporter" => {
            string_or_null(fields.typed::<User>(field)?.map(|u| u.to_string()))
        }
        "components" => names(fields.typed::<Vec<Component>>(field)?),
        "fixVersions" => names(fields.typed::<Vec<Version>>(field)?),
        "issuetype" => string_or_null(fields.typed::<IssueType>(field)?.map(|t| t.name)),
        "subtask" => fields
            .typed::<IssueType>("issuetype")?
            .map(|t| Value::Bool(t.subtask))
            .unwrap_or(Value::Null),
        "priority" => string_or_null(fields.typed::<Priority>(field)?.map(|p| p.name)),
        "resolution" => {
            string_or_null(fields.typed::<Resolution>(field)?.map(|r| r.to_string()))
        }
        "status" => string_or_null(fields.typed::<Status>(field)?.map(|s| s.name)),
        "status_description" => string_or_null(
            fields
                .typed::<Status>("status")?
                .and_then(|s| s.description),
        ),
        _ => fields.get(field).cloned().unwrap_or(Value::Null),
    };

    Ok(value)
}

fn string_or_null(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn names<T: ToString>(items: Option<Vec<T>>) -> Value {
    Value::Array(
        items
            .unwrap_or_default()
            .iter()
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}
