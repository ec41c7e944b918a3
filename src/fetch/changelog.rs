//! Changelog fetching and flattening.
//!
//! Every (history entry, changed field) pair of an issue becomes one
//! [`ChangelogRecord`]; an entry touching three fields yields three records.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::issues::{project_query, IssueFetcher};
use crate::api::{Issue, IssueSource};
use crate::error::{Result, ToolError};
use crate::table::ResultTable;

/// Column names of a changelog table, in order.
pub const CHANGELOG_COLUMNS: [&str; 9] = [
    "key",
    "author",
    "date",
    "field",
    "fieldtype",
    "from_value",
    "from_string",
    "to_value",
    "to_string",
];

/// Progress is logged after this many issues by default.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

const CHANGELOG_EXPAND: &str = "changelog";

/// One field change from an issue's history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogRecord {
    pub issue_key: String,
    pub author: Option<String>,
    pub timestamp: Option<String>,
    pub field_name: Option<String>,
    pub field_type: Option<String>,
    pub from_value: Value,
    pub from_display: Option<String>,
    pub to_value: Value,
    pub to_display: Option<String>,
}

impl ChangelogRecord {
    /// Flatten the expanded changelog of `issue`.
    ///
    /// Records come out in entry order, then field order within each entry.
    /// An issue without a changelog yields no records.
    pub fn from_issue(issue: &Issue) -> Vec<Self> {
        let Some(changelog) = &issue.changelog else {
            warn!("Issue {} has no changelog attribute", issue.key);
            return Vec::new();
        };

        changelog
            .histories
            .iter()
            .flat_map(|history| {
                let author = history.author.as_ref().map(|a| a.to_string());
                history.items.iter().map(move |item| ChangelogRecord {
                    issue_key: issue.key.clone(),
                    author: author.clone(),
                    timestamp: history.created.clone(),
                    field_name: item.field.clone(),
                    field_type: item.field_type.clone(),
                    from_value: item.from.clone(),
                    from_display: item.from_string.clone(),
                    to_value: item.to.clone(),
                    to_display: item.to_string.clone(),
                })
            })
            .collect()
    }

    /// Cells in [`CHANGELOG_COLUMNS`] order.
    pub fn into_cells(self) -> Vec<Value> {
        vec![
            Value::String(self.issue_key),
            opt_string(self.author),
            opt_string(self.timestamp),
            opt_string(self.field_name),
            opt_string(self.field_type),
            self.from_value,
            opt_string(self.from_display),
            self.to_value,
            opt_string(self.to_display),
        ]
    }
}

fn opt_string(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn changelog_table(records: Vec<ChangelogRecord>) -> ResultTable {
    let mut table = ResultTable::new(CHANGELOG_COLUMNS);
    for record in records {
        table.push_row(record.into_cells());
    }
    table
}

/// Fetches issue changelogs into tables.
pub struct ChangelogFetcher<'a, S: IssueSource> {
    source: &'a mut S,
    progress_every: Option<usize>,
}

impl<'a, S: IssueSource> ChangelogFetcher<'a, S> {
    /// Create a fetcher that logs progress every [`DEFAULT_PROGRESS_EVERY`] issues.
    pub fn new(source: &'a mut S) -> Self {
        info!("ChangelogFetcher initialized");
        Self {
            source,
            progress_every: Some(DEFAULT_PROGRESS_EVERY),
        }
    }

    /// Log progress every `every` issues during [`fetch_many`](Self::fetch_many).
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = Some(every).filter(|n| *n > 0);
        self
    }

    /// Do not log progress.
    pub fn without_progress(mut self) -> Self {
        self.progress_every = None;
        self
    }

    /// Fetch the changelog of a single issue.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Fetch`] if the issue cannot be retrieved.
    pub async fn fetch_one(&mut self, issue_key: &str) -> Result<ResultTable> {
        info!("Fetching changelog for issue: {}", issue_key);

        let issue = self
            .source
            .get_issue(issue_key, Some(CHANGELOG_EXPAND))
            .await
            .map_err(|e| {
                ToolError::fetch(format!("Failed to fetch changelog for {}", issue_key), e)
            })?;

        let records = ChangelogRecord::from_issue(&issue);
        if records.is_empty() {
            debug!("No changelog entries for issue {}", issue.key);
        }
        Ok(changelog_table(records))
    }

    /// Fetch changelogs for several issues, one after another.
    ///
    /// A key that fails is logged and skipped; this never fails as a whole.
    pub async fn fetch_many<K: AsRef<str>>(&mut self, issue_keys: &[K]) -> ResultTable {
        let total = issue_keys.len();
        info!("Fetching changelogs for {} issues", total);

        let mut all_records = Vec::new();
        for (idx, key) in issue_keys.iter().enumerate() {
            let key = key.as_ref();
            if let Some(every) = self.progress_every {
                if (idx + 1) % every == 0 {
                    info!("Progress: {}/{} issues processed", idx + 1, total);
                }
            }

            match self.source.get_issue(key, Some(CHANGELOG_EXPAND)).await {
                Ok(issue) => all_records.extend(ChangelogRecord::from_issue(&issue)),
                Err(e) => {
                    warn!("Failed to fetch changelog for {}: {}", key, e);
                    continue;
                }
            }
        }

        info!("Fetched {} changelog entries", all_records.len());
        changelog_table(all_records)
    }

    /// Fetch changelogs for every issue of a project.
    ///
    /// Issue keys are resolved first with a key-only paginated search; no
    /// per-issue call is made when the project has no matching issues.
    pub async fn fetch_for_project(
        &mut self,
        project: &str,
        filter: Option<&str>,
        page_size: u32,
    ) -> Result<ResultTable> {
        let jql = project_query(project, filter);
        info!("Fetching issue keys for project: {}", project);

        let issues = IssueFetcher::new(&mut *self.source, page_size)?
            .collect_issues(&jql, Some(&["key"]))
            .await?;
        let issue_keys: Vec<String> = issues.into_iter().map(|issue| issue.key).collect();

        info!("Found {} issues in project {}", issue_keys.len(), project);
        if issue_keys.is_empty() {
            return Ok(changelog_table(Vec::new()));
        }

        Ok(self.fetch_many(&issue_keys).await)
    }
}
