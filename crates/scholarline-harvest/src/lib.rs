//! Scholarline Harvest - concurrent author publication fetching
//!
//! A [`FetchOrchestrator`] takes a list of author names, runs a bounded pool
//! of query workers against a [`ScholarProvider`], and collects one
//! [`Record`] per publication into a shared sink. Progress is reported over a
//! one-way event channel; a run can be stopped cooperatively at any time and
//! the collected records exported to Parquet or JSON Lines.

pub mod collector;
pub mod config;
pub mod events;
pub mod export;
pub mod provider;
pub mod query;
pub mod record;
pub mod runner;
pub mod schema;
pub mod state;
pub mod stats;
pub mod worker;

pub use collector::RecordSink;
pub use config::{Config, DEFAULT_WORKERS, MAX_WORKERS};
pub use events::{EventKind, EventSender, ProgressEvent};
pub use export::{ExportError, ExportFormat, export_records};
pub use provider::{AuthorDetails, AuthorHandle, PublicationDetails, PublicationStub, ScholarProvider};
pub use query::{KEY_SEPARATOR, QueryKey, ValidationError, parse_query_keys};
pub use record::{NOT_AVAILABLE, Record};
pub use runner::{FetchOrchestrator, StartError};
pub use state::{KeyOutcome, KeyStatus, RunContext};
pub use stats::RunSummary;
pub use worker::process_query;
