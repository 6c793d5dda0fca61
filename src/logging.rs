//! Minimal stderr logging backend.
//!
//! The profile pipeline logs through the `log` facade (with its own
//! buffering, see `preflight_profiles::DelayedLog`); this backend just
//! prints whatever reaches it. Level comes from the `PREFLIGHT_LOG`
//! environment variable (`error`..`trace`, default `info`).

use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let prefix = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        eprintln!("[{prefix}] {}", record.args());
    }

    fn flush(&self) {}
}

/// Install the stderr backend. Safe to call more than once; later calls are
/// no-ops.
pub fn init() {
    let level = std::env::var("PREFLIGHT_LOG")
        .ok()
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
