//! Client-wide and per-call configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable consulted by [`ClientOptions::from_env`].
pub const BASE_URL_ENV: &str = "GAIAROUTER_API_BASE_URL";

/// Ceiling applied to every unary request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A secret string type for sensitive data like API keys and session tokens.
/// Prevents accidental logging or display of secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Transport configuration shared by every request a client issues.
///
/// # Example
/// ```rust
/// use gaiarouter_admin::options::ClientOptions;
/// use std::time::Duration;
///
/// let options = ClientOptions::default()
///     .with_base_url("https://gateway.example.com".to_string())
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(options.base_url, "https://gateway.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the gateway, without a trailing slash.
    pub base_url: String,

    /// Unary request timeout. The streaming path ignores it.
    pub timeout: Duration,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in every request
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            extra_headers: None,
        }
    }
}

impl ClientOptions {
    /// Build options from the environment, falling back to the default base URL.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::default().with_base_url(url),
            _ => Self::default(),
        }
    }

    /// Set the base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Join a request path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Recognized per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Bearer credential to send instead of the session token.
    pub explicit_credential: Option<SecretString>,

    /// Headers added to this request only.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl RequestOptions {
    /// Options carrying only an explicit credential.
    pub fn with_credential(credential: impl Into<SecretString>) -> Self {
        Self {
            explicit_credential: Some(credential.into()),
            extra_headers: None,
        }
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}
