//! Rendering of progress events: spinner lines on a TTY, log lines otherwise

use std::collections::HashMap;

use indicatif::ProgressBar;

use scholarline_core::SharedProgress;
use scholarline_core::progress::finish_line;
use scholarline_harvest::{EventKind, ProgressEvent};

pub struct EventRenderer {
    progress: SharedProgress,
    status: Option<ProgressBar>,
    lines: HashMap<String, ProgressBar>,
    /// Run whose lines are on screen
    current_run: Option<u64>,
}

impl EventRenderer {
    pub fn new(progress: SharedProgress) -> Self {
        Self {
            progress,
            status: None,
            lines: HashMap::new(),
            current_run: None,
        }
    }

    /// Apply one event. Returns `true` once the run has finished.
    pub fn handle(&mut self, event: &ProgressEvent) -> bool {
        if !self.progress.is_tty() {
            match event.kind {
                // Already logged at error level by the worker
                EventKind::Failed => {}
                _ => log::info!("{}", event.text),
            }
            return event.kind == EventKind::RunFinished;
        }

        let key = event.query.as_deref().unwrap_or_default();
        match event.kind {
            EventKind::RunStarted => {
                self.current_run = Some(event.run);
                let status = self.progress.stage_line("fetch");
                status.set_message(event.text.clone());
                self.status = Some(status);
            }
            EventKind::Found => {
                let pb = self.progress.query_line(key);
                pb.set_message("starting");
                self.lines.insert(key.to_string(), pb);
            }
            EventKind::Progress => {
                if let Some(pb) = self.lines.get(key) {
                    pb.inc(1);
                    let detail = event
                        .text
                        .strip_prefix(key)
                        .and_then(|t| t.strip_prefix(": "))
                        .unwrap_or(&event.text);
                    pb.set_message(detail.to_string());
                }
            }
            EventKind::Stopped => {
                if let Some(pb) = self.lines.get(key) {
                    pb.set_message("stopping");
                }
            }
            EventKind::Completed => {
                if let Some(pb) = self.lines.remove(key) {
                    finish_line(&pb, event.text.clone());
                }
            }
            EventKind::NotFound | EventKind::Failed => {
                self.progress.println(&event.text);
            }
            // A previous run can finish after the next one started
            EventKind::RunFinished if self.current_run.is_some_and(|run| run != event.run) => {
                self.progress.println(&event.text);
                return true;
            }
            EventKind::RunFinished => {
                self.current_run = None;
                if let Some(status) = self.status.take() {
                    status.finish_and_clear();
                }
                for (_, pb) in self.lines.drain() {
                    pb.finish_and_clear();
                }
                self.progress.println(&event.text);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use scholarline_core::ProgressContext;

    fn event(kind: EventKind, query: Option<&str>, text: &str) -> ProgressEvent {
        run_event(1, kind, query, text)
    }

    fn run_event(run: u64, kind: EventKind, query: Option<&str>, text: &str) -> ProgressEvent {
        ProgressEvent {
            run,
            kind,
            query: query.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[test]
    fn tty_lines_follow_key_lifecycle() {
        let mut renderer = EventRenderer::new(Arc::new(ProgressContext::with_tty(true)));

        assert!(!renderer.handle(&event(EventKind::RunStarted, None, "Started")));
        renderer.handle(&event(EventKind::Found, Some("A. Smith"), "Found: A. Smith"));
        renderer.handle(&event(EventKind::Progress, Some("A. Smith"), "A. Smith: Paper (2020)"));
        assert_eq!(renderer.lines["A. Smith"].position(), 1);

        renderer.handle(&event(EventKind::Completed, Some("A. Smith"), "Completed"));
        assert!(renderer.lines.is_empty());

        assert!(renderer.handle(&event(EventKind::RunFinished, None, "Finished")));
        assert!(renderer.status.is_none());
    }

    #[test]
    fn late_finish_of_previous_run_keeps_new_lines() {
        let mut renderer = EventRenderer::new(Arc::new(ProgressContext::with_tty(true)));

        renderer.handle(&run_event(2, EventKind::RunStarted, None, "Started"));
        renderer.handle(&run_event(2, EventKind::Found, Some("B. Jones"), "Found: B. Jones"));
        renderer.handle(&run_event(1, EventKind::RunFinished, None, "Finished"));

        assert!(renderer.status.is_some());
        assert!(renderer.lines.contains_key("B. Jones"));

        renderer.handle(&run_event(2, EventKind::RunFinished, None, "Finished"));
        assert!(renderer.status.is_none());
        assert!(renderer.lines.is_empty());
    }

    #[test]
    fn non_tty_only_reports_finish() {
        let mut renderer = EventRenderer::new(Arc::new(ProgressContext::with_tty(false)));
        assert!(!renderer.handle(&event(EventKind::Found, Some("A"), "Found: A")));
        assert!(renderer.lines.is_empty());
        assert!(renderer.handle(&event(EventKind::RunFinished, None, "Finished")));
    }
}
