//! Connection settings for a JIRA server.

use std::fmt;

use tracing::warn;

use super::{ConfigError, Result};

/// Number of issues requested per search call when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Placeholder printed instead of the secret.
pub const REDACTED: &str = "***";

const ENV_SERVER_URL: &str = "JIRA_SERVER_URL";
const ENV_USERNAME: &str = "JIRA_USERNAME";
const ENV_PASSWORD: &str = "JIRA_PASSWORD";
const ENV_PROJECT: &str = "JIRA_PROJECT";
const ENV_BATCH_SIZE: &str = "JIRA_BATCH_SIZE";

/// Validated settings used to reach a JIRA server.
///
/// Built once at startup and never mutated afterwards. The secret is never
/// printed: both `Debug` and `Display` substitute [`REDACTED`].
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    server_url: String,
    username: String,
    secret: String,
    project: Option<String>,
    page_size: u32,
}

impl ConnectionSettings {
    /// Create and validate connection settings.
    ///
    /// A trailing slash is stripped from `server_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the URL, username or secret
    /// is empty, and [`ConfigError::InvalidBatchSize`] when `page_size` is not
    /// a positive integer that fits a request.
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
        project: Option<String>,
        page_size: i64,
    ) -> Result<Self> {
        let server_url = server_url.into();
        let username = username.into();
        let secret = secret.into();

        if server_url.is_empty() {
            return Err(ConfigError::MissingField("JIRA server URL"));
        }
        if username.is_empty() {
            return Err(ConfigError::MissingField("JIRA username"));
        }
        if secret.is_empty() {
            return Err(ConfigError::MissingField("JIRA password/token"));
        }

        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| ConfigError::InvalidBatchSize(page_size.to_string()))?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            username,
            secret,
            project: project.filter(|p| !p.is_empty()),
            page_size,
        })
    }

    /// Load settings from the process environment.
    ///
    /// Reads `JIRA_SERVER_URL`, `JIRA_USERNAME`, `JIRA_PASSWORD`, and the
    /// optional `JIRA_PROJECT` and `JIRA_BATCH_SIZE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    ///
    /// A batch size that is not an integer is not an error here: a warning is
    /// logged and [`DEFAULT_PAGE_SIZE`] is used instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup(ENV_SERVER_URL).unwrap_or_default();
        let username = lookup(ENV_USERNAME).unwrap_or_default();
        let secret = lookup(ENV_PASSWORD).unwrap_or_default();
        let project = lookup(ENV_PROJECT);
        let raw_batch = lookup(ENV_BATCH_SIZE).unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string());

        let page_size = match raw_batch.trim().parse::<i64>() {
            Ok(size) => size,
            Err(_) => {
                warn!(
                    "Invalid {} '{}', using default {}",
                    ENV_BATCH_SIZE, raw_batch, DEFAULT_PAGE_SIZE
                );
                i64::from(DEFAULT_PAGE_SIZE)
            }
        };

        Self::new(server_url, username, secret, project, page_size)
    }

    /// The server URL, without a trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// The username used for Basic authentication.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password or API token.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The default project key, if one was configured.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Issues requested per search call.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("secret", &REDACTED)
            .field("project", &self.project)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConnectionSettings(server_url='{}', username='{}', secret='{}', project='{}', page_size={})",
            self.server_url,
            self.username,
            REDACTED,
            self.project.as_deref().unwrap_or("None"),
            self.page_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn settings(url: &str) -> Result<ConnectionSettings> {
        ConnectionSettings::new(url, "testuser", "testpass", None, 1000)
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_valid_settings() {
        let settings = settings("https://jira.example.com").unwrap();
        assert_eq!(settings.server_url(), "https://jira.example.com");
        assert_eq!(settings.username(), "testuser");
        assert_eq!(settings.secret(), "testpass");
        assert_eq!(settings.project(), None);
        assert_eq!(settings.page_size(), 1000);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let settings = settings("https://jira.example.com/").unwrap();
        assert_eq!(settings.server_url(), "https://jira.example.com");
    }

    #[test]
    fn test_url_without_slash_unchanged() {
        let settings = settings("https://x").unwrap();
        assert_eq!(settings.server_url(), "https://x");
    }

    #[test]
    fn test_empty_url_rejected() {
        assert_eq!(
            settings("").unwrap_err(),
            ConfigError::MissingField("JIRA server URL")
        );
    }

    #[test]
    fn test_empty_username_rejected() {
        let err = ConnectionSettings::new("https://x", "", "pass", None, 10).unwrap_err();
        assert_eq!(err, ConfigError::MissingField("JIRA username"));
        assert_eq!(err.to_string(), "JIRA username is required");
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = ConnectionSettings::new("https://x", "user", "", None, 10).unwrap_err();
        assert_eq!(err, ConfigError::MissingField("JIRA password/token"));
    }

    #[test]
    fn test_non_positive_page_size_rejected() {
        for size in [0, -1, -1000] {
            let err = ConnectionSettings::new("https://x", "user", "pass", None, size).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidBatchSize(_)));
        }
    }

    #[test]
    fn test_oversized_page_size_rejected() {
        let err =
            ConnectionSettings::new("https://x", "user", "pass", None, i64::MAX).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBatchSize(_)));
    }

    #[test]
    fn test_secret_redacted_in_debug_and_display() {
        let settings = ConnectionSettings::new(
            "https://jira.example.com",
            "testuser",
            "super-secret-token",
            Some("PROJ".to_string()),
            500,
        )
        .unwrap();

        let debug = format!("{:?}", settings);
        let display = settings.to_string();

        for printed in [debug, display] {
            assert!(!printed.contains("super-secret-token"));
            assert!(printed.contains(REDACTED));
            assert!(printed.contains("testuser"));
        }
    }

    #[test]
    fn test_from_lookup_full() {
        let settings = ConnectionSettings::from_lookup(lookup_from(&[
            ("JIRA_SERVER_URL", "https://jira.example.com/"),
            ("JIRA_USERNAME", "envuser"),
            ("JIRA_PASSWORD", "envpass"),
            ("JIRA_PROJECT", "PROJ"),
            ("JIRA_BATCH_SIZE", "250"),
        ]))
        .unwrap();

        assert_eq!(settings.server_url(), "https://jira.example.com");
        assert_eq!(settings.username(), "envuser");
        assert_eq!(settings.project(), Some("PROJ"));
        assert_eq!(settings.page_size(), 250);
    }

    #[test]
    fn test_from_lookup_invalid_batch_size_falls_back() {
        let settings = ConnectionSettings::from_lookup(lookup_from(&[
            ("JIRA_SERVER_URL", "https://jira.example.com"),
            ("JIRA_USERNAME", "envuser"),
            ("JIRA_PASSWORD", "envpass"),
            ("JIRA_BATCH_SIZE", "lots"),
        ]))
        .unwrap();

        assert_eq!(settings.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_from_lookup_negative_batch_size_still_fails() {
        let err = ConnectionSettings::from_lookup(lookup_from(&[
            ("JIRA_SERVER_URL", "https://jira.example.com"),
            ("JIRA_USERNAME", "envuser"),
            ("JIRA_PASSWORD", "envpass"),
            ("JIRA_BATCH_SIZE", "-5"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidBatchSize(_)));
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = ConnectionSettings::from_lookup(lookup_from(&[(
            "JIRA_SERVER_URL",
            "https://jira.example.com",
        )]))
        .unwrap_err();

        assert_eq!(err, ConfigError::MissingField("JIRA username"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("JIRA_SERVER_URL", "https://env.example.com/");
        std::env::set_var("JIRA_USERNAME", "envuser");
        std::env::set_var("JIRA_PASSWORD", "envpass");
        std::env::remove_var("JIRA_PROJECT");
        std::env::set_var("JIRA_BATCH_SIZE", "not-a-number");

        let settings = ConnectionSettings::from_env().unwrap();
        assert_eq!(settings.server_url(), "https://env.example.com");
        assert_eq!(settings.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(settings.project(), None);

        for name in [
            "JIRA_SERVER_URL",
            "JIRA_USERNAME",
            "JIRA_PASSWORD",
            "JIRA_BATCH_SIZE",
        ] {
            std::env::remove_var(name);
        }
    }
}
