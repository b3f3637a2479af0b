//! Scholarline S2 - Semantic Scholar Graph API provider
//!
//! Implements [`ScholarProvider`](scholarline_harvest::ScholarProvider) on top
//! of the public author search, author papers and paper detail endpoints.

pub mod api;
pub mod config;
pub mod provider;

pub use api::ApiClient;
pub use config::ApiConfig;
pub use provider::SemanticScholarProvider;
