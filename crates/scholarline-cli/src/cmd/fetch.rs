//! Fetch subcommand - one run over a list of author names, then export

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use scholarline_core::{SharedProgress, fmt_num};
use scholarline_harvest::{export_records, parse_query_keys};

use super::render::EventRenderer;
use super::{HttpFlags, RunArgs, build_orchestrator, default_export_path, install_stop_handler};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Author names separated by ';' (letters, digits, '.', ',' and spaces)
    pub names: String,

    /// Output file (default: timestamped file in the configured output directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Collect without writing an export file
    #[arg(long)]
    pub no_export: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

pub fn run(
    args: FetchArgs,
    config: &Config,
    http: HttpFlags,
    progress: &SharedProgress,
) -> Result<ExitCode> {
    let keys = parse_query_keys(&args.names)?;
    let overrides = args.run.overrides(http);
    let (orch, rx) = build_orchestrator(config, &overrides)?;
    let orch = Arc::new(orch);

    log::info!("Fetching publications for {} authors", keys.len());
    orch.start(keys)?;
    install_stop_handler(&orch, progress)?;

    let mut renderer = EventRenderer::new(progress.clone());
    for event in rx.iter() {
        if renderer.handle(&event) {
            break;
        }
    }
    let summary = orch
        .wait()
        .context("fetch ended without a summary (worker panicked?)")?;

    if progress.is_tty() {
        eprintln!("{}", summary.format_table());
    }

    if args.no_export {
        log::info!("Export skipped, {} records collected", fmt_num(summary.records));
    } else {
        let records = orch.records();
        if records.is_empty() {
            log::warn!("No records collected, nothing to export");
        } else {
            let format = args.run.export_format(args.output.as_deref());
            let path = args.output.clone().unwrap_or_else(|| {
                default_export_path(&config.output.default_dir, format, chrono::Local::now())
            });
            let zstd_level = args.run.zstd_level.unwrap_or(config.output.compression_level);
            let rows = export_records(&records, &path, format, zstd_level)
                .with_context(|| format!("Failed to export to {}", path.display()))?;
            eprintln!("Exported {} records to {}", fmt_num(rows), path.display());
        }
    }

    if summary.was_stopped() {
        log::warn!("Fetch was stopped before all authors were processed");
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}
