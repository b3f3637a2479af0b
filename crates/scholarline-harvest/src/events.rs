//! One-directional progress event channel from workers to the presentation layer

use std::sync::mpsc::{self, Receiver, Sender};

use crate::query::QueryKey;

/// What happened
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Author resolved, item loop starting
    Found,
    /// Search returned nothing for the key
    NotFound,
    /// One publication collected
    Progress,
    /// Worker observed the stop request
    Stopped,
    /// Worker finished its key (after all items, or after `Stopped`)
    Completed,
    /// Key abandoned because the author lookup failed
    Failed,
    RunStarted,
    RunFinished,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Progress => "progress",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RunStarted => "run_started",
            Self::RunFinished => "run_finished",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Run the event belongs to; 0 outside an orchestrated run
    pub run: u64,
    pub kind: EventKind,
    /// Key the event belongs to; `None` for run-level events
    pub query: Option<String>,
    pub text: String,
}

/// Cloneable sending half handed to the orchestrator and every worker.
///
/// Sending never blocks and never fails the caller: once the receiver is
/// gone, events are dropped.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<ProgressEvent>,
    run: u64,
}

impl EventSender {
    /// Sender on the same channel that tags every event with `run`
    pub fn for_run(&self, run: u64) -> Self {
        Self {
            tx: self.tx.clone(),
            run,
        }
    }

    pub fn emit(&self, kind: EventKind, query: Option<&QueryKey>, text: impl Into<String>) {
        let event = ProgressEvent {
            run: self.run,
            kind,
            query: query.map(|q| q.as_str().to_string()),
            text: text.into(),
        };
        if self.tx.send(event).is_err() {
            log::trace!("event receiver dropped, discarding {kind} event");
        }
    }
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx, run: 0 }, rx)
}
