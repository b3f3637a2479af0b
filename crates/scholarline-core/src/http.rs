//! Shared HTTP client with a blocking facade.
//!
//! Uses async reqwest on a small shared tokio runtime, but presents a sync
//! interface so provider calls can run directly on rayon worker threads.

use std::sync::LazyLock;
use std::time::Duration;

use crate::error::FetchError;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default whole-request timeout when the caller does not configure one
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("scholarline/", env!("CARGO_PKG_VERSION"));

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Send a prepared request and block until the body is read as text.
///
/// Non-2xx responses become [`FetchError::Http`] with the status code.
pub fn send_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(&e))?;
        resp.text().await.map_err(|e| classify(&e))
    })
}

/// Map reqwest errors; timeouts become I/O `TimedOut` so they stay retryable.
fn classify(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "request timed out",
        ));
    }
    FetchError::from_reqwest(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_has_version() {
        assert!(USER_AGENT.starts_with("scholarline/"));
        assert!(USER_AGENT.len() > "scholarline/".len());
    }

    #[test]
    fn unreachable_host_is_retryable_error() {
        // Port 9 on localhost is closed in test environments
        let req = http_client()
            .get("http://127.0.0.1:9/")
            .timeout(Duration::from_secs(2));
        let err = send_text(req).unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
    }
}
