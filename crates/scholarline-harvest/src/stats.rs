//! Run summary and reporting

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use scholarline_core::fmt_num;

use crate::state::{KeyOutcome, KeyStatus};

/// Aggregated result of one run, built from the per-key outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_keys: usize,
    pub completed: usize,
    pub stopped: usize,
    pub not_found: usize,
    pub failed: usize,
    pub not_started: usize,
    /// Records appended to the sink
    pub records: usize,
    /// Publications skipped after a fetch error
    pub skipped_items: usize,
    pub elapsed: Duration,
    /// Outcomes in input order
    pub outcomes: Vec<KeyOutcome>,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: Vec<KeyOutcome>, elapsed: Duration) -> Self {
        let mut summary = Self {
            total_keys: outcomes.len(),
            elapsed,
            ..Default::default()
        };
        for o in &outcomes {
            match o.status {
                KeyStatus::Completed => summary.completed += 1,
                KeyStatus::Stopped => summary.stopped += 1,
                KeyStatus::NotFound => summary.not_found += 1,
                KeyStatus::Failed => summary.failed += 1,
                KeyStatus::NotStarted => summary.not_started += 1,
            }
            summary.records += o.records;
            summary.skipped_items += o.skipped;
        }
        summary.outcomes = outcomes;
        summary
    }

    /// Keys whose author was resolved
    pub fn found(&self) -> usize {
        self.completed + self.stopped
    }

    /// Whether the run ended because of a stop request
    pub fn was_stopped(&self) -> bool {
        self.stopped > 0 || self.not_started > 0
    }

    /// One-line description used for the run-finished event
    pub fn headline(&self) -> String {
        let verb = if self.was_stopped() { "Stopped" } else { "Finished" };
        format!(
            "{verb}: {} records from {} queries in {:.1}s",
            fmt_num(self.records),
            self.total_keys,
            self.elapsed.as_secs_f64()
        )
    }

    /// Log minimal summary (non-TTY mode).
    pub fn log(&self) {
        log::info!(
            "{} ({} completed, {} stopped, {} not found, {} failed, {} not started, {} items skipped)",
            self.headline(),
            self.completed,
            self.stopped,
            self.not_found,
            self.failed,
            self.not_started,
            self.skipped_items
        );
    }

    /// Format per-query table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Query")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Status").fg(Color::Cyan),
                Cell::new("Records").fg(Color::Cyan),
                Cell::new("Skipped").fg(Color::Cyan),
            ]);

        for o in &self.outcomes {
            let color = match o.status {
                KeyStatus::Completed => Color::Green,
                KeyStatus::Stopped | KeyStatus::NotStarted => Color::Yellow,
                KeyStatus::NotFound => Color::Grey,
                KeyStatus::Failed => Color::Red,
            };
            table.add_row(vec![
                Cell::new(o.key.as_str()),
                Cell::new(o.status).fg(color),
                Cell::new(fmt_num(o.records)),
                Cell::new(o.skipped),
            ]);
        }

        table.add_row(vec![
            Cell::new("Total").add_attribute(comfy_table::Attribute::Bold),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
            Cell::new(fmt_num(self.records)).fg(Color::Green),
            Cell::new(self.skipped_items),
        ]);

        format!("\n{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryKey;

    fn outcome(key: &str, status: KeyStatus, records: usize, skipped: usize) -> KeyOutcome {
        KeyOutcome {
            key: QueryKey::new(key).unwrap(),
            status,
            records,
            skipped,
        }
    }

    #[test]
    fn aggregates_outcomes() {
        let summary = RunSummary::from_outcomes(
            vec![
                outcome("A. Smith", KeyStatus::Completed, 6, 3),
                outcome("B. Jones", KeyStatus::NotFound, 0, 0),
                outcome("C. Lee", KeyStatus::Failed, 0, 0),
            ],
            Duration::from_millis(1500),
        );

        assert_eq!(summary.total_keys, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.found(), 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records, 6);
        assert_eq!(summary.skipped_items, 3);
        assert!(!summary.was_stopped());
        assert_eq!(summary.headline(), "Finished: 6 records from 3 queries in 1.5s");
    }

    #[test]
    fn stopped_run_headline() {
        let summary = RunSummary::from_outcomes(
            vec![
                outcome("A", KeyStatus::Stopped, 2, 0),
                outcome("B", KeyStatus::NotStarted, 0, 0),
            ],
            Duration::ZERO,
        );
        assert!(summary.was_stopped());
        assert!(summary.headline().starts_with("Stopped: 2 records"));
    }

    #[test]
    fn table_lists_every_query() {
        let summary = RunSummary::from_outcomes(
            vec![
                outcome("A. Smith", KeyStatus::Completed, 1, 0),
                outcome("B. Jones", KeyStatus::NotFound, 0, 0),
            ],
            Duration::ZERO,
        );
        let table = summary.format_table();
        assert!(table.contains("A. Smith"));
        assert!(table.contains("not found"));
        assert!(table.contains("Total"));
    }
}
