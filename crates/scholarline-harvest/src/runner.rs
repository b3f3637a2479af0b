//! Run orchestration: bounded worker pool over a list of query keys

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use scholarline_core::WorkQueue;

use crate::config::Config;
use crate::events::{EventKind, EventSender};
use crate::provider::ScholarProvider;
use crate::query::{QueryKey, ValidationError, parse_query_keys};
use crate::record::Record;
use crate::state::{KeyOutcome, KeyStatus, RunContext};
use crate::stats::RunSummary;
use crate::worker::process_query;

/// Why a run could not be started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// A run is already in progress
    AlreadyRunning,
    /// Input did not yield any valid key
    Validation(ValidationError),
    /// Worker threads could not be created
    Pool(String),
}

impl std::fmt::Display for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a fetch is already running"),
            Self::Validation(e) => write!(f, "{e}"),
            Self::Pool(msg) => write!(f, "failed to start workers: {msg}"),
        }
    }
}

impl std::error::Error for StartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for StartError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Idle/Running state shared with the background run thread
#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    /// Id of the most recently started run
    runs: AtomicU64,
    /// Summary of the most recent finished run
    last: Mutex<Option<RunSummary>>,
    idle: Condvar,
}

impl RunState {
    fn lock_last(&self) -> MutexGuard<'_, Option<RunSummary>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Transition to Idle and wake every waiter
    fn finish(&self, summary: Option<RunSummary>) {
        let mut last = self.lock_last();
        *last = summary;
        self.running.store(false, Ordering::SeqCst);
        self.idle.notify_all();
    }
}

/// Returns the run state to Idle even if a worker panics
struct FinishGuard {
    state: Arc<RunState>,
    summary: Option<RunSummary>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.state.finish(self.summary.take());
    }
}

/// Runs fetches for many query keys with at most `config.workers` in flight.
///
/// `start` returns immediately; the run proceeds on a background thread and
/// reports through the event channel. At most one run is active at a time.
pub struct FetchOrchestrator {
    provider: Arc<dyn ScholarProvider>,
    config: Config,
    ctx: RunContext,
    events: EventSender,
    state: Arc<RunState>,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn ScholarProvider>, config: Config, events: EventSender) -> Self {
        Self::with_context(provider, config, events, RunContext::new())
    }

    /// Use an existing context, e.g. one whose stop flag the provider already
    /// watches during retry backoff
    pub fn with_context(
        provider: Arc<dyn ScholarProvider>,
        config: Config,
        events: EventSender,
        ctx: RunContext,
    ) -> Self {
        Self {
            provider,
            config,
            ctx,
            events,
            state: Arc::new(RunState::default()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared stop flag and record sink
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Id of the most recently started run (0 before the first); matches
    /// [`ProgressEvent::run`](crate::ProgressEvent::run)
    pub fn current_run(&self) -> u64 {
        self.state.runs.load(Ordering::SeqCst)
    }

    /// Validate raw `;`-separated input and start a run over the parsed keys.
    ///
    /// Returns the number of keys queued. On a validation error nothing
    /// changes: a running fetch keeps running and collected records stay.
    pub fn start_raw(&self, input: &str) -> Result<usize, StartError> {
        let keys = parse_query_keys(input)?;
        let n = keys.len();
        self.start(keys)?;
        Ok(n)
    }

    /// Start a run. Clears the stop flag and previously collected records.
    pub fn start(&self, keys: Vec<QueryKey>) -> Result<(), StartError> {
        if keys.is_empty() {
            return Err(StartError::Validation(ValidationError::Empty));
        }
        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StartError::AlreadyRunning);
        }

        *self.state.lock_last() = None;
        self.ctx.reset();
        let run_id = self.state.runs.fetch_add(1, Ordering::SeqCst) + 1;

        let workers = self.config.pool_size(keys.len());
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("harvest-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                self.state.finish(None);
                return Err(StartError::Pool(e.to_string()));
            }
        };

        log::info!(
            "Starting {} queries with {workers} workers via {}",
            keys.len(),
            self.provider.name()
        );

        let run = Run {
            provider: Arc::clone(&self.provider),
            pacing: self.config.pacing,
            ctx: self.ctx.clone(),
            events: self.events.for_run(run_id),
            workers,
        };
        let state = Arc::clone(&self.state);

        let spawned = std::thread::Builder::new()
            .name("harvest-run".to_string())
            .spawn(move || {
                let mut guard = FinishGuard {
                    state,
                    summary: None,
                };
                let summary = pool.install(|| run.execute(keys));
                let headline = summary.headline();
                guard.summary = Some(summary);
                drop(guard);
                run.events.emit(EventKind::RunFinished, None, headline);
            });

        if let Err(e) = spawned {
            self.state.finish(None);
            return Err(StartError::Pool(e.to_string()));
        }
        Ok(())
    }

    /// Request a stop of the active run.
    ///
    /// Returns `true` if this call set the flag. Idle orchestrators and
    /// repeated calls are no-ops. Workers finish their in-flight fetch first.
    pub fn stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        let first = !self.ctx.cancel.swap_set();
        if first {
            log::info!("Stop requested, letting in-flight fetches finish");
        }
        first
    }

    /// Block until Idle; returns the summary of the last finished run
    pub fn wait(&self) -> Option<RunSummary> {
        let last = self.state.lock_last();
        let last = self
            .state
            .idle
            .wait_while(last, |_| self.state.running.load(Ordering::SeqCst))
            .unwrap_or_else(PoisonError::into_inner);
        last.clone()
    }

    /// Like [`wait`](Self::wait) with a deadline; `true` once Idle
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let last = self.state.lock_last();
        let (_last, result) = self
            .state
            .idle
            .wait_timeout_while(last, timeout, |_| {
                self.state.running.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);
        !result.timed_out() || !self.is_running()
    }

    /// Summary of the most recent finished run, if any
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.state.lock_last().clone()
    }

    /// Snapshot of the records collected so far
    pub fn records(&self) -> Vec<Record> {
        self.ctx.sink.snapshot()
    }
}

/// Everything the background run thread owns
struct Run {
    provider: Arc<dyn ScholarProvider>,
    pacing: scholarline_core::PacingPolicy,
    ctx: RunContext,
    events: EventSender,
    workers: usize,
}

impl Run {
    /// Process all keys on the current pool; returns once every worker is done
    fn execute(&self, keys: Vec<QueryKey>) -> RunSummary {
        let start = Instant::now();
        self.events.emit(
            EventKind::RunStarted,
            None,
            format!("Started: {} queries, {} workers", keys.len(), self.workers),
        );

        let queue = WorkQueue::new(keys);
        let outcomes: Mutex<Vec<(usize, KeyOutcome)>> = Mutex::new(Vec::with_capacity(queue.total()));

        rayon::scope(|s| {
            for _ in 0..self.workers {
                s.spawn(|_| {
                    loop {
                        // Checked before claiming so a stopped run leaves keys unclaimed
                        if self.ctx.cancel.is_set() {
                            break;
                        }
                        let Some((idx, key)) = queue.next() else {
                            break;
                        };
                        let outcome = process_query(
                            key,
                            self.provider.as_ref(),
                            &self.ctx,
                            &self.pacing,
                            &self.events,
                        );
                        outcomes
                            .lock()
                            .expect("worker thread panicked")
                            .push((idx, outcome));
                    }
                });
            }
        });

        let mut outcomes = outcomes.into_inner().unwrap_or_else(PoisonError::into_inner);
        for (idx, key) in queue.unclaimed() {
            log::debug!("{key}: not started");
            outcomes.push((idx, KeyOutcome::new(key.clone(), KeyStatus::NotStarted)));
        }
        outcomes.sort_by_key(|(idx, _)| *idx);

        let summary = RunSummary::from_outcomes(
            outcomes.into_iter().map(|(_, o)| o).collect(),
            start.elapsed(),
        );
        summary.log();
        summary
    }
}
