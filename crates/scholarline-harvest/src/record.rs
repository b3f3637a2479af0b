//! Output record model and link extraction

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::provider::PublicationDetails;
use crate::query::QueryKey;

/// Placeholder for missing text fields and for a missing link
pub const NOT_AVAILABLE: &str = "N/A";

/// First http(s) URL; stops at whitespace, quotes and brackets
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'\]]+"#).expect("URL regex is valid"));

/// Punctuation that ends a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', ')', '}'];

/// One exported row. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub query_key: String,
    pub title: String,
    pub authors: String,
    pub citation_count: u32,
    pub year: Option<i32>,
    pub link: String,
}

impl Record {
    /// Build a record from fetched details, filling gaps with placeholders
    pub fn from_details(key: &QueryKey, details: &PublicationDetails) -> Self {
        let link = details
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .or_else(|| extract_link(&details.raw))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            query_key: key.as_str().to_string(),
            title: non_empty_or_na(details.title.as_deref()),
            authors: non_empty_or_na(details.authors.as_deref()),
            citation_count: details.citations.unwrap_or(0),
            year: details.year,
            link,
        }
    }

    /// Year for display, `N/A` when unknown
    pub fn year_label(&self) -> String {
        self.year
            .map_or_else(|| NOT_AVAILABLE.to_string(), |y| y.to_string())
    }
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// First URL-shaped substring of `blob`, without trailing sentence punctuation
pub fn extract_link(blob: &str) -> Option<String> {
    URL_PATTERN
        .find(blob)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|url| url.split_once("://").is_some_and(|(_, rest)| !rest.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> QueryKey {
        QueryKey::new("A. Smith").unwrap()
    }

    #[test]
    fn link_from_free_text() {
        assert_eq!(
            extract_link("see https://example.com/paper"),
            Some("https://example.com/paper".to_string())
        );
    }

    #[test]
    fn link_absent() {
        assert_eq!(extract_link("no links here, only ftp://nope"), None);
        assert_eq!(extract_link(""), None);
    }

    #[test]
    fn first_link_wins() {
        let blob = "profile http://a.org/x then https://b.org/y";
        assert_eq!(extract_link(blob), Some("http://a.org/x".to_string()));
    }

    #[test]
    fn link_inside_json_stops_at_quote() {
        let blob = r#"{"title":"T","url":"https://www.semanticscholar.org/paper/abc","year":2020}"#;
        assert_eq!(
            extract_link(blob),
            Some("https://www.semanticscholar.org/paper/abc".to_string())
        );
    }

    #[test]
    fn trailing_punctuation_dropped() {
        assert_eq!(
            extract_link("(available at https://example.com/p1)."),
            Some("https://example.com/p1".to_string())
        );
    }

    #[test]
    fn record_uses_regex_fallback() {
        let details = PublicationDetails {
            title: Some("Paper".into()),
            raw: "see https://example.com/paper".into(),
            ..Default::default()
        };
        let r = Record::from_details(&key(), &details);
        assert_eq!(r.link, "https://example.com/paper");
    }

    #[test]
    fn record_without_any_link() {
        let details = PublicationDetails {
            raw: "nothing".into(),
            ..Default::default()
        };
        let r = Record::from_details(&key(), &details);
        assert_eq!(r.link, NOT_AVAILABLE);
    }

    #[test]
    fn canonical_link_preferred() {
        let details = PublicationDetails {
            link: Some("https://doi.org/10.1/xyz".into()),
            raw: "profile https://example.com/author".into(),
            ..Default::default()
        };
        let r = Record::from_details(&key(), &details);
        assert_eq!(r.link, "https://doi.org/10.1/xyz");
    }

    #[test]
    fn placeholders_for_missing_fields() {
        let details = PublicationDetails {
            title: Some("   ".into()),
            ..Default::default()
        };
        let r = Record::from_details(&key(), &details);
        assert_eq!(r.query_key, "A. Smith");
        assert_eq!(r.title, NOT_AVAILABLE);
        assert_eq!(r.authors, NOT_AVAILABLE);
        assert_eq!(r.citation_count, 0);
        assert_eq!(r.year, None);
        assert_eq!(r.year_label(), "N/A");
    }

    #[test]
    fn serializes_with_column_names() {
        let r = Record {
            query_key: "A. Smith".into(),
            title: "T".into(),
            authors: "A. Smith, B. Jones".into(),
            citation_count: 3,
            year: Some(2021),
            link: "https://example.com".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        for col in ["QueryKey", "Title", "Authors", "CitationCount", "Year", "Link"] {
            assert!(json.get(col).is_some(), "missing column {col}");
        }
    }
}
