//! Basic authentication for the JIRA API.
//!
//! JIRA accepts `username:password` (Server/Data Center) or `email:api_token`
//! (Cloud) as HTTP Basic credentials.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Authentication credentials for JIRA.
#[derive(Clone)]
pub struct Auth {
    /// The account name.
    username: String,
    /// The complete `Basic ...` authorization header value.
    auth_header: String,
}

impl Auth {
    /// Create new credentials from a username and secret.
    ///
    /// The secret is encoded immediately and the raw value is not stored.
    pub fn new(username: &str, secret: &str) -> Self {
        Self {
            username: username.to_string(),
            auth_header: build_auth_header(username, secret),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Get the account name.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Encode "username:secret" in Base64 and prepend "Basic ".
fn build_auth_header(username: &str, secret: &str) -> String {
    let credentials = format!("{}:{}", username, secret);
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}
