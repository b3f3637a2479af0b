//! Query input parsing and author-name validation

use std::sync::LazyLock;

use regex::Regex;

/// Separator between author names in raw input
pub const KEY_SEPARATOR: char = ';';

/// Allowed characters: ASCII letters, digits, dot, comma, space
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9., ]+$").expect("key regex is valid"));

/// Rejected query input. Nothing has been started when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No non-empty key after splitting
    Empty,
    /// First key containing a disallowed character
    InvalidKey(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "enter at least one author name"),
            Self::InvalidKey(key) => write!(f, "invalid author name: {key}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated author name driving one independent search.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Validate a single, already trimmed name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        if KEY_PATTERN.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(ValidationError::InvalidKey(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split raw input on `;`, trim, drop empty entries, validate every key.
///
/// The whole input is rejected on the first invalid key. Duplicates are kept.
pub fn parse_query_keys(raw: &str) -> Result<Vec<QueryKey>, ValidationError> {
    let keys = raw
        .split(KEY_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(QueryKey::new)
        .collect::<Result<Vec<_>, _>>()?;

    if keys.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(keys)
}
