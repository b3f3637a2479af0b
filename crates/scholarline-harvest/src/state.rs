//! Run context and per-key outcome types

use scholarline_core::CancellationToken;

use crate::collector::RecordSink;
use crate::query::QueryKey;

/// Everything a run shares between the control side and its workers.
///
/// Both fields are cheap `Arc` handles; clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    pub cancel: CancellationToken,
    pub sink: RecordSink,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the stop flag and drop previous records (start of a run)
    pub fn reset(&self) {
        self.cancel.clear();
        self.sink.reset();
    }
}

/// How processing of one key ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStatus {
    /// Every publication was attempted
    Completed,
    /// Stop observed inside the item loop
    Stopped,
    /// Search returned no author
    NotFound,
    /// Author search or author fill failed
    Failed,
    /// Still queued when the stop was observed
    NotStarted,
}

impl KeyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::NotFound => "not found",
            Self::Failed => "failed",
            Self::NotStarted => "not started",
        }
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one query worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyOutcome {
    pub key: QueryKey,
    pub status: KeyStatus,
    /// Records appended to the sink for this key
    pub records: usize,
    /// Publications whose fetch failed and were skipped
    pub skipped: usize,
}

impl KeyOutcome {
    pub fn new(key: QueryKey, status: KeyStatus) -> Self {
        Self {
            key,
            status,
            records: 0,
            skipped: 0,
        }
    }
}
