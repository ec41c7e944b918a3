//! JIRA REST transport.
//!
//! Thin async wrapper over the JIRA REST API v2. Handles authentication and
//! maps HTTP failures to [`ApiError`]. Requests are never retried.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use tracing::{debug, instrument};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::types::{Issue, SearchResult, ServerInfo};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The JIRA transport handle.
#[derive(Debug)]
pub struct JiraClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the JIRA instance.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
}

impl JiraClient {
    /// Create a new client with explicit credentials.
    ///
    /// Does NOT contact the server; see [`JiraClient::server_info`].
    pub fn with_credentials(base_url: &str, username: &str, secret: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::new(username, secret),
        })
    }

    /// Fetch server metadata.
    ///
    /// Calls `GET /rest/api/2/serverInfo`; used to verify reachability and
    /// credentials.
    #[instrument(skip(self))]
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let url = format!("{}/rest/api/2/serverInfo", self.base_url);
        self.get(&url).await
    }

    /// Search for issues using JQL.
    ///
    /// # Arguments
    ///
    /// * `jql` - The JQL query string
    /// * `start_at` - The index of the first issue to return (0-based)
    /// * `max_results` - Maximum number of issues to return
    /// * `projection` - Fields to return; `None` requests all fields
    #[instrument(skip(self, projection), fields(jql = %jql))]
    pub async fn search_issues(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        projection: Option<&[&str]>,
    ) -> Result<SearchResult> {
        debug!("Searching issues: startAt={}, maxResults={}", start_at, max_results);

        let mut url = format!(
            "{}/rest/api/2/search?jql={}&startAt={}&maxResults={}",
            self.base_url,
            urlencoding::encode(jql),
            start_at,
            max_results
        );
        let field_list = projection.map(|f| f.join(",")).unwrap_or_else(|| "*all".to_string());
        url.push_str("&fields=");
        url.push_str(&urlencoding::encode(&field_list));

        let result: SearchResult = self.get(&url).await?;
        debug!("Found {} issues (total: {})", result.issues.len(), result.total);
        Ok(result)
    }

    /// Get a single issue by key.
    ///
    /// # Arguments
    ///
    /// * `key` - The issue key (e.g., "PROJ-123")
    /// * `expand` - Comma-separated expansions (e.g., "changelog")
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn get_issue(&self, key: &str, expand: Option<&str>) -> Result<Issue> {
        debug!("Fetching issue");

        let mut url = format!(
            "{}/rest/api/2/issue/{}",
            self.base_url,
            urlencoding::encode(key)
        );
        if let Some(expand) = expand {
            url.push_str("?expand=");
            url.push_str(&urlencoding::encode(expand));
        }

        self.get(&url).await.map_err(|e| {
            if matches!(e, ApiError::NotFound(_)) {
                ApiError::NotFound(format!("Issue '{}' not found", key))
            } else {
                e
            }
        })
    }

    /// Perform a single authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Check the status and parse the JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);

            Err(Self::error_from_response(status, &url, &error_body))
        }
    }

    /// Create an error from an HTTP response, preferring JIRA's own messages.
    fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            let messages: Vec<String> = json
                .get("errorMessages")
                .and_then(|m| m.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if !messages.is_empty() {
                return ApiError::from_status(status, &messages.join(", "));
            }

            let errors: Vec<String> = json
                .get("errors")
                .and_then(|e| e.as_object())
                .map(|obj| obj.iter().map(|(k, v)| format!("{}: {}", k, v)).collect())
                .unwrap_or_default();
            if !errors.is_empty() {
                return ApiError::from_status(status, &errors.join(", "));
            }
        }

        ApiError::from_status(status, url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
