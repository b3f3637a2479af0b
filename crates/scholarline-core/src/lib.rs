//! Scholarline Core - Common infrastructure for paced, cancellable fetching
//!
//! This crate provides the reusable pieces shared by the harvest pipeline
//! and its providers: cancellation, request pacing, error classification,
//! retries, the shared HTTP client, progress display and Parquet output.

pub mod cancel;
pub mod error;
pub mod http;
pub mod logging;
pub mod pacing;
pub mod progress;
pub mod retry;
pub mod sink;
pub mod work_queue;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use error::FetchError;
pub use http::{SHARED_RUNTIME, http_client, send_text};
pub use logging::{IndicatifLogger, init_logging};
pub use pacing::PacingPolicy;
pub use progress::{ProgressContext, SharedProgress, fmt_num, truncate_chars};
pub use retry::retry_with_backoff;
pub use sink::{ParquetSink, discard_tmp, is_valid_parquet, tmp_path_for};
pub use work_queue::WorkQueue;
