//! Paginated issue fetching.

use tracing::{debug, error, info, warn};

use super::fields::{IssueRecord, DEFAULT_FIELDS};
use crate::api::{Issue, IssueSource};
use crate::config::{ConfigError, DEFAULT_PAGE_SIZE};
use crate::error::{Result, ToolError};
use crate::table::ResultTable;

/// Build the JQL for all issues of a project, optionally narrowed by a filter.
pub fn project_query(project: &str, filter: Option<&str>) -> String {
    let jql = format!("project = '{}'", project);
    match filter {
        Some(filter) if !filter.is_empty() => format!("{} AND {}", jql, filter),
        _ => jql,
    }
}

/// Fetches issues page by page and flattens them into a table.
pub struct IssueFetcher<'a, S: IssueSource> {
    source: &'a mut S,
    page_size: u32,
}

impl<'a, S: IssueSource> IssueFetcher<'a, S> {
    /// Create a fetcher requesting `page_size` issues per call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBatchSize`] when `page_size` is 0, since
    /// the offset would never advance.
    pub fn new(source: &'a mut S, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(ConfigError::InvalidBatchSize(page_size.to_string()).into());
        }
        info!("IssueFetcher initialized with page_size={}", page_size);
        Ok(Self { source, page_size })
    }

    /// Create a fetcher with the default page size.
    pub fn with_default_page_size(source: &'a mut S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Issues requested per search call.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch all issues of a project.
    pub async fn fetch_project(
        &mut self,
        project: &str,
        filter: Option<&str>,
        fields: Option<&[&str]>,
    ) -> Result<ResultTable> {
        let jql = project_query(project, filter);
        info!("Fetching issues with JQL: {}", jql);
        self.fetch_all(&jql, fields).await
    }

    /// Fetch every issue matching `jql` and flatten it.
    ///
    /// `fields` selects the record columns; `None` uses [`DEFAULT_FIELDS`].
    /// No matches is a zero-row table, not an error.
    pub async fn fetch_all(&mut self, jql: &str, fields: Option<&[&str]>) -> Result<ResultTable> {
        let issues = self.collect_issues(jql, None).await?;
        info!("Fetched {} issues", issues.len());

        let fields = fields.unwrap_or(&DEFAULT_FIELDS);
        let mut table = ResultTable::new(fields.iter().copied());

        if issues.is_empty() {
            warn!("No issues found matching the query");
            return Ok(table);
        }

        for issue in &issues {
            table.push_row(IssueRecord::extract(issue, fields).into_cells());
        }
        debug!(
            "Created table with {} rows and {} columns",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }

    /// Collect the raw issues matching `jql` across all pages.
    ///
    /// Pages are requested at offsets 0, `page_size`, `2 * page_size`, ...
    /// until a page comes back empty or shorter than `page_size`. There is no
    /// upper bound on the number of pages. Any failure discards what was
    /// collected so far.
    pub async fn collect_issues(
        &mut self,
        jql: &str,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Issue>> {
        let mut all_issues = Vec::new();
        let mut start_at: u32 = 0;
        let page_size = self.page_size as usize;

        loop {
            debug!(
                "Fetching issues starting at {} (page size: {})",
                start_at, self.page_size
            );

            let page = self
                .source
                .search(jql, start_at, self.page_size, projection)
                .await
                .map_err(|e| {
                    error!("Failed to fetch issues: {}", e);
                    ToolError::fetch("Failed to fetch issues", e)
                })?;

            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            all_issues.extend(page);
            debug!("Fetched {} issues, total: {}", page_len, all_issues.len());

            if page_len < page_size {
                break;
            }

            start_at = start_at.saturating_add(self.page_size);
        }

        Ok(all_issues)
    }
}
