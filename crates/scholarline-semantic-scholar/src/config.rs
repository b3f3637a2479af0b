//! S2 API client configuration

use std::time::Duration;

use scholarline_core::http::DEFAULT_REQUEST_TIMEOUT;

/// Public Graph API root
pub const DEFAULT_API_URL: &str = "https://api.semanticscholar.org/graph/v1/";

/// Environment variable holding the optional API key
pub const API_KEY_ENV: &str = "S2_API_KEY";

/// Transport retries for one request (429, 5xx, timeouts)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/`
    pub api_url: String,
    /// Sent as `x-api-key`; unauthenticated requests share a lower rate limit
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ApiConfig {
    /// Defaults plus the API key from `S2_API_KEY`, when set and non-empty
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_base(url);
        self
    }

    /// Absolute URL for an endpoint path such as `author/search`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

// Keep the key out of debug logs
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn normalize_base(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
