//! `ScholarProvider` backed by the Semantic Scholar Graph API

use scholarline_core::{CancellationToken, FetchError};
use scholarline_harvest::{
    AuthorDetails, AuthorHandle, PublicationDetails, PublicationStub, ScholarProvider,
};

use crate::api::{
    self, AUTHOR_FIELDS, ApiClient, PAPER_FIELDS, PAPERS_PAGE_SIZE, Paper, PaperRef,
};
use crate::config::ApiConfig;

pub struct SemanticScholarProvider {
    client: ApiClient,
}

impl SemanticScholarProvider {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }

    /// Cut retry backoff short once `cancel` is set
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.client = self.client.with_cancel(cancel);
        self
    }

    /// All papers of an author, following `next` offsets
    fn author_papers(&self, author_id: &str) -> Result<Vec<PaperRef>, FetchError> {
        let path = format!("author/{author_id}/papers");
        let mut papers = Vec::new();
        let mut offset = 0usize;
        loop {
            let body = self.client.get(
                &path,
                &[
                    ("fields", "title".to_string()),
                    ("limit", PAPERS_PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                ],
            )?;
            let page = api::parse_papers_page(&body)?;
            papers.extend(page.data);
            match page.next {
                Some(next) if next > offset && !self.client.cancel().is_set() => offset = next,
                _ => break,
            }
        }
        log::debug!("author {author_id}: {} papers listed", papers.len());
        Ok(papers)
    }
}

impl ScholarProvider for SemanticScholarProvider {
    fn name(&self) -> &str {
        "semantic-scholar"
    }

    fn search_author(&self, name: &str) -> Result<Option<AuthorHandle>, FetchError> {
        let body = self.client.get(
            "author/search",
            &[
                ("query", name.to_string()),
                ("limit", "1".to_string()),
                ("fields", AUTHOR_FIELDS.to_string()),
            ],
        )?;
        Ok(api::parse_search(&body)?.map(|author| AuthorHandle {
            name: author.name.unwrap_or_else(|| name.to_string()),
            id: author.author_id,
        }))
    }

    fn fill_author(&self, handle: &AuthorHandle) -> Result<AuthorDetails, FetchError> {
        let body = self.client.get(
            &format!("author/{}", handle.id),
            &[("fields", AUTHOR_FIELDS.to_string())],
        )?;
        let author = api::parse_author(&body)?;
        let publications = self
            .author_papers(&handle.id)?
            .into_iter()
            .filter_map(to_stub)
            .collect();

        Ok(AuthorDetails {
            name: author.name.unwrap_or_else(|| handle.name.clone()),
            affiliation: author.affiliations.into_iter().next(),
            publications,
        })
    }

    fn fill_publication(&self, stub: &PublicationStub) -> Result<PublicationDetails, FetchError> {
        let body = self.client.get(
            &format!("paper/{}", stub.id),
            &[("fields", PAPER_FIELDS.to_string())],
        )?;
        let paper = api::parse_paper(&body)?;
        Ok(to_details(paper, stub, body))
    }
}

/// Papers without an id cannot be filled and are dropped from the list
fn to_stub(paper: PaperRef) -> Option<PublicationStub> {
    Some(PublicationStub {
        id: paper.paper_id.filter(|id| !id.is_empty())?,
        title: paper.title,
    })
}

fn to_details(paper: Paper, stub: &PublicationStub, raw: String) -> PublicationDetails {
    PublicationDetails {
        authors: paper.author_names(),
        link: paper.best_link(),
        title: paper.title.or_else(|| stub.title.clone()),
        citations: paper.citation_count,
        year: paper.year,
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_skip_missing_ids() {
        let stubs: Vec<PublicationStub> = [
            PaperRef {
                paper_id: Some("a".into()),
                title: Some("First".into()),
            },
            PaperRef {
                paper_id: None,
                title: Some("Orphan".into()),
            },
            PaperRef {
                paper_id: Some(String::new()),
                title: None,
            },
        ]
        .into_iter()
        .filter_map(to_stub)
        .collect();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].id, "a");
    }

    #[test]
    fn details_from_paper() {
        let body = r#"{"paperId": "p1", "title": null, "authors": [{"name": "A. Smith"}],
            "citationCount": 4, "year": 2021, "url": "https://www.semanticscholar.org/paper/p1"}"#;
        let paper = api::parse_paper(body).unwrap();
        let stub = PublicationStub {
            id: "p1".into(),
            title: Some("Listed title".into()),
        };
        let details = to_details(paper, &stub, body.to_string());

        assert_eq!(details.title.as_deref(), Some("Listed title"));
        assert_eq!(details.authors.as_deref(), Some("A. Smith"));
        assert_eq!(details.citations, Some(4));
        assert_eq!(details.year, Some(2021));
        assert_eq!(
            details.link.as_deref(),
            Some("https://www.semanticscholar.org/paper/p1")
        );
        assert_eq!(details.raw, body);
    }

    #[test]
    fn unreachable_api_is_fetch_error() {
        let config = ApiConfig {
            max_retries: 0,
            timeout: std::time::Duration::from_secs(2),
            ..ApiConfig::default().with_api_url("http://127.0.0.1:9/graph/v1")
        };
        let provider = SemanticScholarProvider::new(config);
        assert!(provider.search_author("A. Smith").is_err());
    }
}
