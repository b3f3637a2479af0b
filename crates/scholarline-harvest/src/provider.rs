//! Data provider capability consumed by query workers

use scholarline_core::FetchError;

/// Resolved author reference returned by a search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorHandle {
    /// Provider-specific identifier
    pub id: String,
    pub name: String,
}

/// Author metadata plus the author's publications in provider order
#[derive(Clone, Debug, Default)]
pub struct AuthorDetails {
    pub name: String,
    pub affiliation: Option<String>,
    pub publications: Vec<PublicationStub>,
}

/// One publication still needing its own detail fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicationStub {
    pub id: String,
    pub title: Option<String>,
}

/// Fully fetched publication
#[derive(Clone, Debug, Default)]
pub struct PublicationDetails {
    pub title: Option<String>,
    /// Author names, already joined for display
    pub authors: Option<String>,
    pub citations: Option<u32>,
    pub year: Option<i32>,
    /// Canonical link, when the provider exposes one
    pub link: Option<String>,
    /// Serialized detail payload; searched for a URL when `link` is absent
    pub raw: String,
}

/// Blocking, individually fallible access to an academic data source.
///
/// Implementations are shared by all workers of a run, hence `Send + Sync`.
pub trait ScholarProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Find the best matching author, `Ok(None)` when nothing matches
    fn search_author(&self, name: &str) -> Result<Option<AuthorHandle>, FetchError>;

    /// Fetch author metadata and publication list
    fn fill_author(&self, handle: &AuthorHandle) -> Result<AuthorDetails, FetchError>;

    /// Fetch the details of one publication
    fn fill_publication(&self, stub: &PublicationStub) -> Result<PublicationDetails, FetchError>;
}
