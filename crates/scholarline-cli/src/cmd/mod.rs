pub mod fetch;
pub mod render;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, ValueEnum};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use scholarline_core::{PacingPolicy, SharedProgress};
use scholarline_harvest::{ExportFormat, FetchOrchestrator, ProgressEvent, RunContext, events};
use scholarline_semantic_scholar::SemanticScholarProvider;

use crate::config::{Config, Overrides};

/// Flags shared by `fetch` and `session`
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Number of authors fetched concurrently (1-5)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Minimum delay between publication fetches of one worker (ms)
    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    /// Maximum delay between publication fetches of one worker (ms)
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Export format (default: from file extension, else parquet)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Zstd compression level for Parquet output (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum FormatArg {
    Parquet,
    Jsonl,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Parquet => ExportFormat::Parquet,
            FormatArg::Jsonl => ExportFormat::JsonLines,
        }
    }
}

/// Global HTTP flags from the top-level command line
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFlags {
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl RunArgs {
    pub fn overrides(&self, http: HttpFlags) -> Overrides {
        Overrides {
            workers: self.workers,
            min_delay_ms: self.min_delay_ms,
            max_delay_ms: self.max_delay_ms,
            timeout_secs: http.timeout_secs,
            max_retries: http.max_retries,
        }
    }

    /// Explicit flag, else the output path's extension
    pub fn export_format(&self, output: Option<&Path>) -> ExportFormat {
        match (self.format, output) {
            (Some(f), _) => f.into(),
            (None, Some(path)) => ExportFormat::from_path(path),
            (None, None) => ExportFormat::default(),
        }
    }
}

/// Orchestrator over the Semantic Scholar provider, plus its event receiver.
///
/// The provider watches the run's stop flag so retry backoff ends with a stop.
pub fn build_orchestrator(
    config: &Config,
    overrides: &Overrides,
) -> Result<(FetchOrchestrator, Receiver<ProgressEvent>)> {
    let harvest = config.harvest_config(overrides)?;
    let ctx = RunContext::new();
    let provider = SemanticScholarProvider::new(config.api_config(overrides))
        .with_cancel(ctx.cancel.clone());

    log::debug!(
        "{} workers, pacing {}-{}ms",
        harvest.workers,
        harvest.pacing.min().as_millis(),
        harvest.pacing.max().as_millis()
    );

    let (tx, rx) = events::channel();
    let orch = FetchOrchestrator::with_context(Arc::new(provider), harvest, tx, ctx);
    Ok((orch, rx))
}

/// Timestamped export path inside `dir`
pub fn default_export_path(dir: &Path, format: ExportFormat, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "scholarline_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// What one SIGINT/SIGTERM does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// No run is active; nothing to stop
    Idle,
    /// First signal of this run; a stop was requested
    Stopping,
    /// Second signal of the same run
    Exit,
}

/// Counts signals per run, independent of `stop` commands
#[derive(Debug, Default)]
pub struct StopSignals {
    signalled_run: Option<u64>,
}

impl StopSignals {
    pub fn on_signal(&mut self, orch: &FetchOrchestrator) -> SignalAction {
        if !orch.is_running() {
            return SignalAction::Idle;
        }
        let run = orch.current_run();
        if self.signalled_run == Some(run) {
            return SignalAction::Exit;
        }
        self.signalled_run = Some(run);
        orch.stop();
        SignalAction::Stopping
    }
}

/// Handle SIGINT/SIGTERM on a background thread.
///
/// The first signal of a run stops it, the second exits with 130. Signals
/// while idle only print a notice, so collected records are not lost.
pub fn install_stop_handler(orch: &Arc<FetchOrchestrator>, progress: &SharedProgress) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    // Weak so the orchestrator, and with it the event channel, can still close
    let orch = Arc::downgrade(orch);
    let progress = progress.clone();
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let mut presses = StopSignals::default();
            for _ in signals.forever() {
                let Some(orch) = orch.upgrade() else {
                    break;
                };
                match presses.on_signal(&orch) {
                    SignalAction::Idle => progress.println("No fetch is running"),
                    SignalAction::Stopping => {
                        progress.println("Stopping after in-flight fetches, interrupt again to exit")
                    }
                    SignalAction::Exit => {
                        log::warn!("Interrupted twice, exiting without waiting");
                        std::process::exit(130);
                    }
                }
            }
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

/// Notice about request pacing and blocking risk
pub fn info_text(pacing: &PacingPolicy) -> String {
    format!(
        "Publication details are fetched with a random delay between {:.1} and {:.1} seconds,\n\
         so collecting a long publication list is slow. The delay lowers the risk of being\n\
         rate limited or blocked by the data provider.\n\
         \n\
         Requests are not disguised or rotated, so blocking is still possible. If requests\n\
         start failing with HTTP 429, wait a while, configure an API key ([s2] api_key or\n\
         S2_API_KEY), or raise the delay with --min-delay-ms/--max-delay-ms.\n\
         \n\
         Stopping lets every worker finish the fetch it is doing; records collected so far\n\
         are kept and can be exported.",
        pacing.min().as_secs_f64(),
        pacing.max().as_secs_f64()
    )
}
