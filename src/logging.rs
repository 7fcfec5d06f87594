//! Logging handle shared by every installer component
//!
//! Components never touch a process-wide logger. They receive a [`Logger`]
//! at construction time and emit through it; the binary wires it to an
//! `env_logger` formatter, tests wire it to a [`MemorySink`].

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Target stamped on every record (shows up as `[get-cloudify]`)
pub const TARGET: &str = "get-cloudify";

/// Console verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only errors (`--quiet`)
    Quiet,
    #[default]
    Normal,
    /// Everything including subprocess stdout (`--verbose`)
    Verbose,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }
}

/// Cloneable handle around a `log::Log` sink
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Log>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self { sink }
    }

    /// Logger backed by an in-memory sink, returned alongside for inspection
    pub fn memory() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (Self::new(sink.clone()), sink)
    }

    /// Emit `message` at `level`; `None` is the suppressed severity and drops it
    pub fn log_at(&self, level: Option<Level>, message: impl fmt::Display) {
        let Some(level) = level else {
            return;
        };
        self.sink.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(TARGET)
                .build(),
        );
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log_at(Some(Level::Debug), message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log_at(Some(Level::Info), message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log_at(Some(Level::Warn), message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log_at(Some(Level::Error), message);
    }

    pub fn flush(&self) {
        self.sink.flush();
    }
}

/// Build the console logger: `HH:MM:SS [LEVEL] [get-cloudify] message` on stdout
///
/// `RUST_LOG`, when set, takes precedence over the verbosity flags.
pub fn init(verbosity: Verbosity) -> Logger {
    let logger = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(verbosity.level_filter())
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .build();

    Logger::new(Arc::new(logger))
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Messages logged at exactly `level`
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Log for MemorySink {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppressed_severity_is_dropped() {
        let (logger, sink) = Logger::memory();
        logger.log_at(None, "hidden");
        logger.info("shown");

        assert_eq!(sink.records(), vec![(Level::Info, "shown".to_string())]);
    }

    #[test]
    fn verbosity_maps_to_filters() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::Error);
        assert_eq!(Verbosity::default().level_filter(), LevelFilter::Info);
        assert_eq!(Verbosity::Verbose.level_filter(), LevelFilter::Debug);
    }
}
