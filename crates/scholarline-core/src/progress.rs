//! Progress display for TTY and non-TTY environments.
//!
//! TTY mode: one indicatif spinner line per query plus a run status line.
//! Non-TTY mode: log-based output (no progress bars).

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Width of the query label column
const LABEL_WIDTH: usize = 24;

/// Per-query line: spinner, label, item counter, last message
fn query_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:<24.dim} {pos:>5} items {wide_msg:.dim}")
        .expect("invalid template")
}

/// Finished per-query line (no spinner)
fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {prefix:<24.dim} {pos:>5} items {wide_msg}")
        .expect("invalid template")
}

/// Switch a query line to its finished style with a final message.
pub fn finish_line(pb: &ProgressBar, msg: impl Into<String>) {
    pb.set_style(done_style());
    pb.finish_with_message(msg.into());
}

/// Central progress context managing multi-progress lines.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self::with_tty(std::io::stderr().is_terminal())
    }

    /// Create a context with an explicit TTY decision.
    pub fn with_tty(is_tty: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Create a spinner line for one query key.
    ///
    /// TTY: visible spinner; position counts collected items.
    /// Non-TTY: hidden (no-op).
    pub fn query_line(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(query_style());
        pb.set_prefix(truncate_chars(name, LABEL_WIDTH));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Create a run status line managed by MultiProgress.
    ///
    /// Update with `pb.set_message(...)` as the run progresses.
    pub fn stage_line(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:<10.cyan.bold} {wide_msg}")
                .expect("invalid template"),
        );
        pb.set_prefix(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Print a line above managed progress bars (avoids interference).
    ///
    /// Use this instead of `eprintln!` when progress bars are active.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for `ProgressContext`.
pub type SharedProgress = Arc<ProgressContext>;

/// Truncate to at most `max` characters, appending `...` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Format number with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_small() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(12), "12");
        assert_eq!(fmt_num(123), "123");
    }

    #[test]
    fn fmt_num_thousands() {
        assert_eq!(fmt_num(1_000), "1,000");
        assert_eq!(fmt_num(123_456), "123,456");
        assert_eq!(fmt_num(1_234_567), "1,234,567");
    }

    #[test]
    fn truncate_short_untouched() {
        assert_eq!(truncate_chars("Deep learning", 40), "Deep learning");
    }

    #[test]
    fn truncate_long_adds_ellipsis() {
        assert_eq!(truncate_chars("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Multi-byte characters must not be split
        assert_eq!(truncate_chars("ñandú über", 3), "ñan...");
    }

    #[test]
    fn non_tty_lines_are_hidden() {
        let ctx = ProgressContext::with_tty(false);
        assert!(!ctx.is_tty());
        assert!(ctx.query_line("A. Smith").is_hidden());
        assert!(ctx.stage_line("run").is_hidden());
    }
}
