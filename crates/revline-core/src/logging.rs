//! Logging setup: env_logger, routed through indicatif on a terminal

use std::io::Write;

use indicatif::MultiProgress;

/// How chatty the pipeline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (_, true) => Self::Debug,
            (true, false) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }

    fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Debug => "debug",
        }
    }
}

fn label(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

fn ansi(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    }
}

/// Logger that suspends the progress display while writing a line.
pub struct ProgressLogger {
    filter: env_logger::Logger,
    multi: MultiProgress,
}

impl log::Log for ProgressLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.filter.enabled(record.metadata()) {
            return;
        }
        let level = record.level();
        let line = format!("[{}{}\x1b[0m] {}", ansi(level), label(level), record.args());
        self.multi.suspend(|| eprintln!("{line}"));
    }

    fn flush(&self) {
        self.filter.flush();
    }
}

/// Install the global logger. `RUST_LOG` overrides the verbosity.
///
/// With `multi` set (terminal mode) lines are colored and printed above
/// the progress bars; otherwise plain labels go to stderr.
pub fn init_logging(
    verbosity: Verbosity,
    multi: Option<&MultiProgress>,
) -> Result<(), log::SetLoggerError> {
    let env = env_logger::Env::default().default_filter_or(verbosity.default_filter());

    match multi {
        Some(multi) => {
            let filter = env_logger::Builder::from_env(env).build();
            let max_level = filter.filter();
            log::set_boxed_logger(Box::new(ProgressLogger {
                filter,
                multi: multi.clone(),
            }))?;
            log::set_max_level(max_level);
            Ok(())
        }
        None => env_logger::Builder::from_env(env)
            .format(|buf, record| writeln!(buf, "[{}] {}", label(record.level()), record.args()))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_wins_over_quiet() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false).default_filter(), "info");
    }
}
