//! Logging setup: env_logger backend, routed through indicatif on a TTY

use indicatif::MultiProgress;

/// ANSI color code and padded label for a log level.
fn level_style(level: log::Level, color: bool) -> (&'static str, &'static str, &'static str) {
    let label = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    if !color {
        return ("", label, "");
    }
    let ansi = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (ansi, label, "\x1b[0m")
}

/// Default filter level derived from CLI flags
pub fn default_level(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Logger that prints through indicatif MultiProgress so lines never tear spinners.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            // Only constructed for TTY output, so color is always on
            let (pre, label, post) = level_style(record.level(), true);
            let line = format!("[{pre}{label}{post}] {}", record.args());
            self.multi.suspend(|| eprintln!("{line}"));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging once per process.
///
/// With `multi`, log lines are printed above the progress display;
/// otherwise plain `[LEVEL] message` lines go to stderr. `RUST_LOG`
/// overrides the level chosen from `quiet`/`debug`.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or(default_level(quiet, debug));

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(env).build();
        let max_level = logger.filter();

        if log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone()))).is_ok() {
            log::set_max_level(max_level);
        }
    } else {
        // Non-TTY: no ANSI colors
        let _ = env_logger::Builder::from_env(env)
            .format(|buf, record| {
                let (_, label, _) = level_style(record.level(), false);
                writeln!(buf, "[{label}] {}", record.args())
            })
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_flags() {
        assert_eq!(default_level(false, false), "info");
        assert_eq!(default_level(true, false), "warn");
        // debug wins over quiet
        assert_eq!(default_level(true, true), "debug");
    }

    #[test]
    fn plain_labels_have_no_ansi() {
        let (pre, label, post) = level_style(log::Level::Warn, false);
        assert_eq!((pre, label, post), ("", "WARN ", ""));
    }

    #[test]
    fn colored_labels_reset() {
        let (pre, _, post) = level_style(log::Level::Error, true);
        assert_eq!(pre, "\x1b[31m");
        assert_eq!(post, "\x1b[0m");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(true, false, None);
        init_logging(false, true, None);
    }
}
