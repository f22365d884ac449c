// Log lines look like `timestamp|LEVEL|src/generate.rs:120: message` and go
// to stderr. `main` picks the level from `CADENCE_LOG`.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::{LazyLock, OnceLock},
};

use {jiff::tz::TimeZone, log::Log};

use crate::style::Theme;

#[derive(Debug)]
pub struct Logger {
    tz: OnceLock<TimeZone>,
}

impl Logger {
    /// Installs a new logger as the global logger.
    ///
    /// Timestamps are in UTC until `set_time_zone` is called. Finding the
    /// system time zone logs too, so it can't be done up front.
    pub fn init() -> Result<&'static Logger, log::SetLoggerError> {
        let logger = Box::leak(Box::new(Logger { tz: OnceLock::new() }));
        log::set_logger(logger)?;
        Ok(logger)
    }

    pub fn set_time_zone(&self, tz: TimeZone) {
        if self.tz.set(tz).is_err() {
            log::debug!("log time zone was already set");
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Not `Zoned::now()`, which could look up the system time zone and
        // log while doing it.
        let now = jiff::Timestamp::now();
        let now = match self.tz.get() {
            Some(tz) => now.to_zoned(tz.clone()).to_string(),
            None => now.to_string(),
        };
        eprintln!("{}", line(Theme::stderr().highlight(now), record));
    }

    fn flush(&self) {}
}

fn line(now: impl Display, record: &log::Record<'_>) -> String {
    let mut out = format!("{now}|{}", record.level());
    if let Some(file) = record.file() {
        out.push('|');
        out.push_str(relative(file));
        if let Some(n) = record.line() {
            out.push_str(&format!(":{n}"));
        }
    }
    format!("{out}: {}", record.args())
}

/// Strips the current directory from `path` when it's a prefix.
fn relative(path: &str) -> &str {
    static CWD: LazyLock<Option<PathBuf>> =
        LazyLock::new(|| std::env::current_dir().ok());
    CWD.as_deref()
        .and_then(|cwd| Path::new(path).strip_prefix(cwd).ok())
        .and_then(|rel| rel.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use log::{Level, Record};

    use super::*;

    #[test]
    fn lines() {
        let got = line(
            "NOW",
            &Record::builder()
                .args(format_args!("stopping after 7 days"))
                .level(Level::Debug)
                .file(Some("src/generate.rs"))
                .line(Some(120))
                .build(),
        );
        assert_eq!(
            got,
            "NOW|DEBUG|src/generate.rs:120: stopping after 7 days",
        );

        let got = line(
            "NOW",
            &Record::builder()
                .args(format_args!("no location"))
                .level(Level::Warn)
                .build(),
        );
        assert_eq!(got, "NOW|WARN: no location");
    }
}
