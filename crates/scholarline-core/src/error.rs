//! Error type for a single provider fetch (search, author fill, publication fill)

/// Failure of one call into an external data provider.
///
/// Workers treat this as recoverable: a failed publication is skipped,
/// a failed author lookup ends only that query.
#[derive(Debug)]
pub enum FetchError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Response body could not be decoded
    Parse(String),
    /// Provider-specific failure without a transport cause
    Provider(String),
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Provider(msg) => write!(f, "provider error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl FetchError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped so API endpoints and keys do not end up in logs.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: match e.url() {
                Some(url) => e.to_string().replace(url.as_str(), "<url>"),
                None => e.to_string(),
            },
        }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Only rate limiting (429), server errors (5xx), timeouts and
    /// connection-level failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, None | Some(429) | Some(500..=599)),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Self::Parse(_) | Self::Provider(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
