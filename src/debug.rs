//! Logging backend for the `log` facade.
//!
//! Every record is written to stderr (stdout carries JSON-RPC) and, when
//! `logging.file` is configured, mirrored into that file.
//!
//! The level is chosen in this order:
//! 1. `--log-level` on the command line
//! 2. `RUST_LOG`, when it is a bare level name such as `debug`
//! 3. `DEBUG_LEVEL` (0-4)
//! 4. `logging.level` in the config file
//! 5. `info`

use log::{LevelFilter, Log, Metadata, Record};
use mmdc_mcp_config::LoggingSettings;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;

/// Numeric `DEBUG_LEVEL` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    /// Parse a `DEBUG_LEVEL` value. Anything outside 0-4 is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<u8>().ok()? {
            0 => Some(DebugLevel::Off),
            1 => Some(DebugLevel::Error),
            2 => Some(DebugLevel::Info),
            3 => Some(DebugLevel::Debug),
            4 => Some(DebugLevel::Trace),
            _ => None,
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            DebugLevel::Off => LevelFilter::Off,
            DebugLevel::Error => LevelFilter::Error,
            DebugLevel::Info => LevelFilter::Info,
            DebugLevel::Debug => LevelFilter::Debug,
            DebugLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level_name(value: &str) -> Option<LevelFilter> {
    value.trim().parse::<LevelFilter>().ok()
}

/// Apply the precedence rules above to already-read inputs.
pub fn resolve_level(
    cli_level: Option<LevelFilter>,
    rust_log: Option<&str>,
    debug_level: Option<&str>,
    config_level: Option<&str>,
) -> LevelFilter {
    cli_level
        .or_else(|| rust_log.and_then(parse_level_name))
        .or_else(|| {
            debug_level
                .and_then(DebugLevel::parse)
                .map(DebugLevel::to_level_filter)
        })
        .or_else(|| config_level.and_then(parse_level_name))
        .unwrap_or(LevelFilter::Info)
}

struct LogBridge {
    level: LevelFilter,
    file: Option<Mutex<std::fs::File>>,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            &chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            record,
        );
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        if let Some(file) = &self.file {
            let _ = file.lock().write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

fn format_line(timestamp: &str, record: &Record) -> String {
    format!(
        "[{timestamp}] [{:<5}] [{}] {}\n",
        record.level(),
        record.target(),
        record.args()
    )
}

/// Install the logger. Later calls are ignored.
pub fn init_log_bridge(cli_level: Option<LevelFilter>, settings: &LoggingSettings) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let debug_level = std::env::var("DEBUG_LEVEL").ok();
    let level = resolve_level(
        cli_level,
        rust_log.as_deref(),
        debug_level.as_deref(),
        settings.level.as_deref(),
    );

    let file = settings.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(Mutex::new(f)),
            Err(e) => {
                eprintln!("mmdc-mcp: cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    let bridge: &'static LogBridge = Box::leak(Box::new(LogBridge { level, file }));
    if log::set_logger(bridge).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        assert_eq!(
            resolve_level(Some(LevelFilter::Trace), Some("error"), Some("1"), Some("warn")),
            LevelFilter::Trace
        );
    }

    #[test]
    fn test_rust_log_must_be_a_bare_level() {
        assert_eq!(
            resolve_level(None, Some("DEBUG"), Some("1"), None),
            LevelFilter::Debug
        );
        assert_eq!(
            resolve_level(None, Some("mmdc_mcp=debug"), Some("1"), None),
            LevelFilter::Error
        );
    }

    #[test]
    fn test_debug_level_then_config_then_default() {
        assert_eq!(resolve_level(None, None, Some("0"), Some("debug")), LevelFilter::Off);
        assert_eq!(resolve_level(None, None, Some("9"), Some("warn")), LevelFilter::Warn);
        assert_eq!(resolve_level(None, None, None, None), LevelFilter::Info);
    }

    #[test]
    fn test_format_line() {
        let record = Record::builder()
            .level(log::Level::Warn)
            .target("mmdc_mcp_server::invoker")
            .args(format_args!("mmdc failed: boom"))
            .build();
        assert_eq!(
            format_line("2026-01-01T00:00:00.000", &record),
            "[2026-01-01T00:00:00.000] [WARN ] [mmdc_mcp_server::invoker] mmdc failed: boom\n"
        );
    }
}
