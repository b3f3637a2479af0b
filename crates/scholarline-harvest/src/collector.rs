//! In-memory record sink shared by all workers of a run

use std::sync::{Arc, Mutex, PoisonError};

use crate::record::Record;

/// Append-only record collection, cleared between runs.
///
/// Appends from concurrent workers are serialized by a mutex, so each one is
/// atomic and immediately visible to [`snapshot`](Self::snapshot).
#[derive(Clone, Debug, Default)]
pub struct RecordSink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all records. Only called while no worker is active.
    pub fn reset(&self) {
        self.lock().clear();
    }

    pub fn append(&self, record: Record) {
        self.lock().push(record);
    }

    /// Point-in-time copy of the collected records
    pub fn snapshot(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Records are whole values, so a panic elsewhere cannot leave the Vec torn
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
