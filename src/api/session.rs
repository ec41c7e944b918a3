//! Connection session for a JIRA server.
//!
//! A [`JiraSession`] owns at most one transport handle. It starts
//! disconnected, connects explicitly or on first use, and releases the handle
//! on [`JiraSession::disconnect`] or when dropped.

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::client::JiraClient;
use super::types::Issue;
use crate::config::ConnectionSettings;
use crate::error::{Result, ToolError};

/// Something the fetchers can pull issues from.
#[async_trait]
pub trait IssueSource: Send {
    /// Return up to `max_results` issues matching `jql`, starting at `start_at`.
    ///
    /// Fewer than `max_results` issues means the results are exhausted.
    /// `fields` restricts the returned fields; `None` requests all of them.
    async fn search(
        &mut self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: Option<&[&str]>,
    ) -> Result<Vec<Issue>>;

    /// Fetch one issue, with optional expansions such as `changelog`.
    async fn get_issue(&mut self, key: &str, expand: Option<&str>) -> Result<Issue>;
}

/// Connection state of a session.
#[derive(Debug)]
enum SessionState {
    Disconnected,
    Connected(JiraClient),
}

/// A session against one JIRA server.
#[derive(Debug)]
pub struct JiraSession {
    settings: ConnectionSettings,
    state: SessionState,
}

impl JiraSession {
    /// Create a disconnected session.
    pub fn new(settings: ConnectionSettings) -> Self {
        info!("JiraSession initialized for server: {}", settings.server_url());
        Self {
            settings,
            state: SessionState::Disconnected,
        }
    }

    /// Create a session and connect it.
    pub async fn open(settings: ConnectionSettings) -> Result<Self> {
        let mut session = Self::new(settings);
        session.connect().await?;
        Ok(session)
    }

    /// Establish a connection, replacing any existing handle.
    ///
    /// The connection is verified by requesting server metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Authentication`] when the server answers 401/403
    /// and [`ToolError::Connection`] for any other failure.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to JIRA server: {}", self.settings.server_url());

        let client = JiraClient::with_credentials(
            self.settings.server_url(),
            self.settings.username(),
            self.settings.secret(),
        )
        .map_err(ToolError::from_connect)?;

        let server_info = client.server_info().await.map_err(|e| {
            error!("Connection validation failed: {}", e);
            ToolError::from_connect(e)
        })?;

        info!(
            "Connected to JIRA server version: {}",
            server_info.version.as_deref().unwrap_or("unknown")
        );
        self.state = SessionState::Connected(client);
        Ok(())
    }

    /// Release the connection. Does nothing when already disconnected.
    pub fn disconnect(&mut self) {
        if let SessionState::Connected(_) =
            std::mem::replace(&mut self.state, SessionState::Disconnected)
        {
            info!("Disconnected from JIRA server");
        }
    }

    /// Whether a transport handle is currently held.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// The settings this session was created with.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Return the live handle, connecting first if needed.
    pub async fn ensure_connected(&mut self) -> Result<&JiraClient> {
        if !self.is_connected() {
            self.connect().await?;
        }
        match &self.state {
            SessionState::Connected(client) => Ok(client),
            SessionState::Disconnected => Err(ToolError::Connection(
                "Not connected to JIRA".to_string(),
            )),
        }
    }
}

#[async_trait]
impl IssueSource for JiraSession {
    async fn search(
        &mut self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: Option<&[&str]>,
    ) -> Result<Vec<Issue>> {
        let client = self.ensure_connected().await?;
        let limit = max_results as usize;
        let mut issues: Vec<Issue> = Vec::new();

        // The server may cap maxResults below what was asked for, so keep
        // requesting until the limit is filled or the results run out.
        while issues.len() < limit {
            let collected = issues.len() as u32;
            let offset = start_at.saturating_add(collected);
            let page = client
                .search_issues(jql, offset, max_results - collected, fields)
                .await?;

            let page_len = page.issues.len();
            let short_page = page_len == 0 || page_len < page.max_results as usize;
            let reached_total = u64::from(offset) + page_len as u64 >= u64::from(page.total);
            issues.extend(page.issues);

            if short_page || reached_total {
                break;
            }
            debug!(
                "Server returned {} of {} requested issues, continuing at {}",
                page_len,
                max_results - collected,
                offset as usize + page_len
            );
        }

        issues.truncate(limit);
        Ok(issues)
    }

    async fn get_issue(&mut self, key: &str, expand: Option<&str>) -> Result<Issue> {
        let client = self.ensure_connected().await?;
        Ok(client.get_issue(key, expand).await?)
    }
}

impl Drop for JiraSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::IssueFetcher;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ConnectionSettings {
        ConnectionSettings::new(server.uri(), "testuser", "testpass", None, 50).unwrap()
    }

    async fn mount_server_info(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/rest/api/2/serverInfo"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"version": "9.4.0"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let server = MockServer::start().await;
        let session = JiraSession::new(settings_for(&server));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;

        let mut session = JiraSession::new(settings_for(&server));
        session.connect().await.unwrap();
        assert!(session.is_connected());

        session.disconnect();
        assert!(!session.is_connected());

        // Second disconnect is a no-op.
        session.disconnect();
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_twice_reconnects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/serverInfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let mut session = JiraSession::new(settings_for(&server));
        session.connect().await.unwrap();
        session.connect().await.unwrap();
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_unauthorized_is_authentication_error() {
        let server = MockServer::start().await;
        mount_server_info(&server, 401).await;

        let mut session = JiraSession::new(settings_for(&server));
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, ToolError::Authentication(_)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_forbidden_is_authentication_error() {
        let server = MockServer::start().await;
        mount_server_info(&server, 403).await;

        let err = JiraSession::open(settings_for(&server)).await.unwrap_err();
        assert!(matches!(err, ToolError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_connect_server_error_is_connection_error() {
        let server = MockServer::start().await;
        mount_server_info(&server, 500).await;

        let err = JiraSession::open(settings_for(&server)).await.unwrap_err();
        assert!(matches!(err, ToolError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_unreachable_is_connection_error() {
        let settings =
            ConnectionSettings::new("http://127.0.0.1:1", "testuser", "testpass", None, 50)
                .unwrap();
        let err = JiraSession::open(settings).await.unwrap_err();
        assert!(matches!(err, ToolError::Connection(_)));
    }

    #[tokio::test]
    async fn test_search_connects_lazily() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{"key": "PROJ-1", "fields": {}}]
            })))
            .mount(&server)
            .await;

        let mut session = JiraSession::new(settings_for(&server));
        let issues = session.search("project = 'PROJ'", 0, 50, None).await.unwrap();

        assert!(session.is_connected());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "PROJ-1");
    }

    fn issue_page(start: usize, count: usize, total: usize) -> serde_json::Value {
        let issues: Vec<_> = (start..start + count)
            .map(|n| json!({"key": format!("PROJ-{}", n + 1), "fields": {}}))
            .collect();
        json!({"startAt": start, "maxResults": 100, "total": total, "issues": issues})
    }

    async fn mount_capped_search(server: &MockServer) {
        for (start, count) in [(0, 100), (100, 100), (200, 50)] {
            Mock::given(method("GET"))
                .and(path("/rest/api/2/search"))
                .and(query_param("startAt", start.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(issue_page(start, count, 250)))
                .expect(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_search_fills_limit_when_server_caps_page_size() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;
        mount_capped_search(&server).await;

        let mut session = JiraSession::open(settings_for(&server)).await.unwrap();
        let issues = session.search("project = 'PROJ'", 0, 1000, None).await.unwrap();

        assert_eq!(issues.len(), 250);
        assert_eq!(issues[0].key, "PROJ-1");
        assert_eq!(issues[249].key, "PROJ-250");
    }

    #[tokio::test]
    async fn test_fetcher_reads_every_issue_past_server_cap() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;
        mount_capped_search(&server).await;

        let mut session = JiraSession::open(settings_for(&server)).await.unwrap();
        let table = IssueFetcher::new(&mut session, 1000)
            .unwrap()
            .fetch_all("project = 'PROJ'", Some(&["key"]))
            .await
            .unwrap();

        assert_eq!(table.len(), 250);
    }

    #[tokio::test]
    async fn test_search_stops_at_requested_limit() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .and(query_param("maxResults", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_page(0, 100, 250)))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = JiraSession::open(settings_for(&server)).await.unwrap();
        let issues = session.search("project = 'PROJ'", 0, 100, None).await.unwrap();

        assert_eq!(issues.len(), 100);
    }

    #[tokio::test]
    async fn test_get_issue_error_propagates() {
        let server = MockServer::start().await;
        mount_server_info(&server, 200).await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/PROJ-9"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut session = JiraSession::open(settings_for(&server)).await.unwrap();
        let err = session.get_issue("PROJ-9", Some("changelog")).await.unwrap_err();
        assert!(matches!(err, ToolError::Api(_)));
    }
}
