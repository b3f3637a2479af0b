//! Session subcommand - interactive start/stop/export loop on stdin

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use scholarline_core::{SharedProgress, fmt_num};
use scholarline_harvest::{ExportFormat, FetchOrchestrator, export_records};

use super::render::EventRenderer;
use super::{HttpFlags, RunArgs, build_orchestrator, default_export_path, info_text, install_stop_handler};
use crate::config::Config;

const HELP: &str = "\
Commands:
  start <names>   start fetching; names separated by ';'
  stop            stop the running fetch (collected records are kept)
  status          show whether a fetch is running and how many records exist
  export [path]   write collected records (default: timestamped file)
  info            show notes on request pacing
  help            show this list
  quit            stop any running fetch and exit";

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Directory for exports without an explicit path
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Outcome of one command line
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Continue(String),
    Quit,
}

/// Command interpreter around one orchestrator
pub struct Session {
    orch: Arc<FetchOrchestrator>,
    output_dir: PathBuf,
    format: ExportFormat,
    zstd_level: i32,
}

impl Session {
    pub fn new(orch: Arc<FetchOrchestrator>, output_dir: PathBuf, format: ExportFormat, zstd_level: i32) -> Self {
        Self {
            orch,
            output_dir,
            format,
            zstd_level,
        }
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orch
    }

    pub fn execute(&self, line: &str) -> Reply {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let text = match command.to_ascii_lowercase().as_str() {
            "" => String::new(),
            "start" => match self.orch.start_raw(rest) {
                Ok(n) => format!("Started {n} queries"),
                Err(e) => format!("Error: {e}"),
            },
            "stop" => {
                if self.orch.stop() {
                    "Stopping, waiting for in-flight fetches".to_string()
                } else if self.orch.is_running() {
                    "Stop already requested".to_string()
                } else {
                    "No fetch is running".to_string()
                }
            }
            "status" => self.status(),
            "export" => self.export((!rest.is_empty()).then(|| Path::new(rest))),
            "info" => info_text(&self.orch.config().pacing),
            "help" | "?" => HELP.to_string(),
            "quit" | "exit" => return Reply::Quit,
            other => format!("Unknown command: {other} (type 'help')"),
        };
        Reply::Continue(text)
    }

    fn status(&self) -> String {
        let records = fmt_num(self.orch.context().sink.len());
        if self.orch.is_running() {
            let stopping = if self.orch.context().cancel.is_set() {
                ", stopping"
            } else {
                ""
            };
            return format!("Running{stopping}: {records} records so far");
        }
        match self.orch.last_summary() {
            Some(summary) => format!("Idle. Last run: {}", summary.headline()),
            None => format!("Idle: {records} records"),
        }
    }

    fn export(&self, path: Option<&Path>) -> String {
        let records = self.orch.records();
        let format = path.map_or(self.format, ExportFormat::from_path);
        let path = path.map_or_else(
            || default_export_path(&self.output_dir, format, chrono::Local::now()),
            Path::to_path_buf,
        );
        match export_records(&records, &path, format, self.zstd_level) {
            Ok(rows) => format!("Exported {} records to {}", fmt_num(rows), path.display()),
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Stop any active run and wait for it to go idle
    pub fn shutdown(&self) {
        if self.orch.stop() {
            log::info!("Waiting for in-flight fetches before exit");
        }
        self.orch.wait();
    }
}

pub fn run(
    args: SessionArgs,
    config: &Config,
    http: HttpFlags,
    progress: &SharedProgress,
) -> Result<ExitCode> {
    let overrides = args.run.overrides(http);
    let (orch, rx) = build_orchestrator(config, &overrides)?;
    let orch = Arc::new(orch);
    install_stop_handler(&orch, progress)?;

    let renderer_progress = progress.clone();
    let drain = std::thread::Builder::new()
        .name("events".to_string())
        .spawn(move || {
            let mut renderer = EventRenderer::new(renderer_progress);
            for event in rx {
                renderer.handle(&event);
            }
        })
        .context("Failed to spawn event thread")?;

    let session = Session::new(
        orch,
        args.output_dir
            .unwrap_or_else(|| config.output.default_dir.clone()),
        args.run.export_format(None),
        args.run.zstd_level.unwrap_or(config.output.compression_level),
    );

    progress.println(HELP);
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        match session.execute(&line) {
            Reply::Continue(text) if text.is_empty() => {}
            Reply::Continue(text) => progress.println(text),
            Reply::Quit => break,
        }
    }

    session.shutdown();
    // Dropping the last orchestrator handle closes the channel once the run
    // thread exits; the signal thread only holds a weak one
    drop(session);
    if drain.join().is_err() {
        log::error!("event thread panicked");
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    use scholarline_core::{FetchError, PacingPolicy};
    use scholarline_harvest::{
        AuthorDetails, AuthorHandle, PublicationDetails, PublicationStub, ScholarProvider, events,
    };
    use tempfile::TempDir;

    /// Knows exactly one author with one paper
    struct OneAuthor;

    impl ScholarProvider for OneAuthor {
        fn name(&self) -> &str {
            "one-author"
        }

        fn search_author(&self, name: &str) -> Result<Option<AuthorHandle>, FetchError> {
            Ok((name == "A. Smith").then(|| AuthorHandle {
                id: "1".into(),
                name: name.into(),
            }))
        }

        fn fill_author(&self, handle: &AuthorHandle) -> Result<AuthorDetails, FetchError> {
            Ok(AuthorDetails {
                name: handle.name.clone(),
                affiliation: None,
                publications: vec![PublicationStub {
                    id: "p1".into(),
                    title: None,
                }],
            })
        }

        fn fill_publication(&self, _stub: &PublicationStub) -> Result<PublicationDetails, FetchError> {
            Ok(PublicationDetails {
                title: Some("Only Paper".into()),
                year: Some(2024),
                ..Default::default()
            })
        }
    }

    fn session(dir: &Path) -> Session {
        let (tx, _rx) = events::channel();
        let config = scholarline_harvest::Config {
            workers: 2,
            pacing: PacingPolicy::disabled(),
        };
        let orch = Arc::new(FetchOrchestrator::new(Arc::new(OneAuthor), config, tx));
        Session::new(orch, dir.to_path_buf(), ExportFormat::JsonLines, 3)
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Continue(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn start_wait_export() {
        let dir = TempDir::new().unwrap();
        let s = session(dir.path());

        assert_eq!(text(s.execute("start A. Smith; B. Jones")), "Started 2 queries");
        s.orchestrator().wait();
        assert!(text(s.execute("status")).starts_with("Idle. Last run: Finished: 1 records"));

        let out = dir.path().join("out.jsonl");
        let reply = text(s.execute(&format!("export {}", out.display())));
        assert!(reply.starts_with("Exported 1 records"), "{reply}");
        assert!(out.exists());

        let reply = text(s.execute("export"));
        assert!(reply.contains("scholarline_"), "{reply}");
    }

    #[test]
    fn invalid_names_rejected() {
        let dir = TempDir::new().unwrap();
        let s = session(dir.path());
        assert_eq!(
            text(s.execute("start A#Smith")),
            "Error: invalid author name: A#Smith"
        );
        assert_eq!(
            text(s.execute("start")),
            "Error: enter at least one author name"
        );
        assert!(!s.orchestrator().is_running());
    }

    #[test]
    fn idle_commands() {
        let dir = TempDir::new().unwrap();
        let s = session(dir.path());
        assert_eq!(text(s.execute("stop")), "No fetch is running");
        assert_eq!(text(s.execute("status")), "Idle: 0 records");
        assert!(text(s.execute("export")).starts_with("Error: nothing to export"));
        assert!(text(s.execute("info")).contains("random delay"));
        assert!(text(s.execute("help")).contains("start <names>"));
        assert_eq!(text(s.execute("   ")), "");
        assert!(text(s.execute("frobnicate")).starts_with("Unknown command"));
        assert_eq!(s.execute("quit"), Reply::Quit);
        s.shutdown();
    }
}
