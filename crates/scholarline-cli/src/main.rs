//! scholarline - fetch author publication lists into Parquet or JSON Lines
//!
//! Resolves each author name against Semantic Scholar, fetches every
//! publication with paced requests on a bounded worker pool, and exports
//! the collected records.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use cmd::HttpFlags;
use config::{Config, Overrides};

#[derive(Parser)]
#[command(name = "scholarline")]
#[command(about = "Concurrent author publication fetcher")]
#[command(
    long_about = "Concurrent author publication fetcher.\n\n\
    Publication details are fetched with a random delay (0.5-2.5s by default) to lower the \
    risk of rate limiting; large publication lists take a while. Ctrl-C stops a running \
    fetch after in-flight requests finish; press it again to exit immediately."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./scholarline.toml or ~/.config/scholarline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Whole-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Maximum retry attempts for transient HTTP failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch publications for authors separated by ';' and export them
    Fetch(cmd::fetch::FetchArgs),
    /// Interactive session: start, stop and export from stdin commands
    Session(cmd::session::SessionArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let progress = Arc::new(scholarline_core::ProgressContext::new());

    // TTY: spinners show activity, so only warnings unless --debug
    // non-TTY: logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.debug);
    scholarline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    let http = HttpFlags {
        timeout_secs: cli.timeout_secs,
        max_retries: cli.max_retries,
    };

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, http, &progress),
        Command::Session(args) => cmd::session::run(args, &config, http, &progress),
        Command::Config => {
            print_config(&config, http)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_config(config: &Config, http: HttpFlags) -> Result<()> {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let overrides = Overrides {
        timeout_secs: http.timeout_secs,
        max_retries: http.max_retries,
        ..Default::default()
    };
    let pacing = config.pacing_policy(&overrides)?;
    let api = config.api_config(&overrides);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Output directory",
        &config.output.default_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Compression level",
        &config.output.compression_level.to_string(),
    ]);
    table.add_row(vec![
        "Workers",
        &format!(
            "{} (max: {})",
            config.worker_count(None)?,
            config.workers.max.clamp(1, scholarline_harvest::MAX_WORKERS)
        ),
    ]);
    table.add_row(vec![
        "Pacing",
        &format!("{}-{}ms", pacing.min().as_millis(), pacing.max().as_millis()),
    ]);
    table.add_row(vec!["S2 API URL", &api.api_url]);
    table.add_row(vec![
        "S2 API key",
        if api.api_key.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec!["Timeout", &format!("{}s", api.timeout.as_secs())]);
    table.add_row(vec!["Max retries", &api.max_retries.to_string()]);

    eprintln!("\n{table}");
    Ok(())
}
