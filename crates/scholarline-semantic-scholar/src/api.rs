//! Semantic Scholar Graph API client and response models

use serde::Deserialize;

use scholarline_core::{CancellationToken, FetchError, http_client, retry_with_backoff, send_text};

use crate::config::ApiConfig;

/// Fields requested for an author
pub const AUTHOR_FIELDS: &str = "name,affiliations";

/// Fields requested for one paper
pub const PAPER_FIELDS: &str =
    "title,authors,citationCount,year,url,externalIds,openAccessPdf";

/// Papers per page of the author papers endpoint (API maximum)
pub const PAPERS_PAGE_SIZE: usize = 1000;

/// Blocking API client. Retries transient failures with exponential backoff;
/// the backoff wait ends early once `cancel` is set.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// GET `path` with query parameters, returning the response body
    pub fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = self.config.endpoint(path);
        retry_with_backoff(
            path,
            self.config.max_retries,
            |delay| self.cancel.sleep(delay),
            || {
                let mut request = http_client()
                    .get(&url)
                    .query(query)
                    .timeout(self.config.timeout);
                if let Some(key) = &self.config.api_key {
                    request = request.header("x-api-key", key);
                }
                send_text(request)
            },
        )
    }
}

// =============================================================================
// Response models
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthorSearchResponse {
    #[serde(default)]
    pub data: Vec<Author>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub author_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub affiliations: Vec<String>,
}

/// One page of `author/{id}/papers`
#[derive(Debug, Deserialize)]
pub struct PapersPage {
    #[serde(default)]
    pub data: Vec<PaperRef>,
    /// Offset of the next page; absent on the last page
    pub next: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRef {
    pub paper_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<PaperAuthor>,
    pub citation_count: Option<u32>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub external_ids: Option<ExternalIds>,
    pub open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaperAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExternalIds {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    #[serde(rename = "ArXiv")]
    pub arxiv: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAccessPdf {
    pub url: Option<String>,
}

impl Paper {
    /// Author names joined for display
    pub fn author_names(&self) -> Option<String> {
        let names: Vec<&str> = self
            .authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .filter(|n| !n.is_empty())
            .collect();
        (!names.is_empty()).then(|| names.join(", "))
    }

    /// Best available link: open-access PDF, then S2 page, then DOI
    pub fn best_link(&self) -> Option<String> {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
        self.open_access_pdf
            .as_ref()
            .and_then(|pdf| non_empty(&pdf.url))
            .or_else(|| non_empty(&self.url))
            .or_else(|| {
                self.external_ids
                    .as_ref()
                    .and_then(|ids| non_empty(&ids.doi))
                    .map(|doi| format!("https://doi.org/{doi}"))
            })
    }
}

pub fn parse_search(body: &str) -> Result<Option<Author>, FetchError> {
    let resp: AuthorSearchResponse = serde_json::from_str(body)?;
    Ok(resp.data.into_iter().next())
}

pub fn parse_author(body: &str) -> Result<Author, FetchError> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_papers_page(body: &str) -> Result<PapersPage, FetchError> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_paper(body: &str) -> Result<Paper, FetchError> {
    Ok(serde_json::from_str(body)?)
}
