//! Process-wide rolling file logs for the user store.
//!
//! # Responsibility
//! - Start the `flexi_logger` file backend at most once per process.
//! - Capture panics as metadata-only log events.
//!
//! # Invariants
//! - Re-initializing with the same level and directory is a no-op.
//! - Re-initializing with a different level or directory is an error.
//! - Nothing here panics.
//!
//! # See also
//! - DESIGN.md (logging entry)

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "userstore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 4 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 120;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

const LEVEL_ALIASES: &[(&str, &str)] = &[
    ("trace", "trace"),
    ("debug", "debug"),
    ("info", "info"),
    ("warn", "warn"),
    ("warning", "warn"),
    ("error", "error"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    log_dir: PathBuf,
}

impl LogSettings {
    /// Parses caller input into a canonical level and an absolute directory.
    fn parse(level: &str, log_dir: &str) -> Result<Self, String> {
        let wanted = level.trim().to_ascii_lowercase();
        let level = LEVEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, canonical)| *canonical)
            .ok_or_else(|| {
                format!("log level `{wanted}` is not one of trace|debug|info|warn|error")
            })?;

        let dir = log_dir.trim();
        if dir.is_empty() {
            return Err("log directory is required".to_string());
        }
        let log_dir = PathBuf::from(dir);
        if log_dir.is_relative() {
            return Err(format!("log directory `{dir}` is not absolute"));
        }

        Ok(Self { level, log_dir })
    }

    fn ensure_matches(&self, requested: &Self) -> Result<(), String> {
        if self.log_dir != requested.log_dir {
            return Err(format!(
                "logging already writes to `{}`; refusing to switch to `{}`",
                self.log_dir.display(),
                requested.log_dir.display()
            ));
        }
        if self.level != requested.level {
            return Err(format!(
                "logging already runs at level `{}`; refusing to switch to `{}`",
                self.level, requested.level
            ));
        }
        Ok(())
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// - Unknown `level` (accepted: trace, debug, info, warn, error).
/// - Empty or relative `log_dir`, or a directory that cannot be created.
/// - Logging already running with different settings.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let requested = LogSettings::parse(level, log_dir)?;
    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(&requested))?;
    active.settings.ensure_matches(&requested)
}

/// Returns `(level, log_dir)` of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.settings.level, active.settings.log_dir.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(settings: &LogSettings) -> Result<ActiveLogger, String> {
    let dir = settings.log_dir.as_path();
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("failed to create log directory `{}`: {err}", dir.display()))?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook();

    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={}",
        settings.level,
        dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=logging status=error location={location} payload={}",
            one_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Replaces line breaks with spaces and caps the result at `max_chars`.
fn one_line(value: &str, max_chars: usize) -> String {
    let mut chars = value
        .chars()
        .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c });
    let mut line: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, LogSettings};
    use std::path::PathBuf;

    fn settings(level: &'static str, dir: &str) -> LogSettings {
        LogSettings {
            level,
            log_dir: PathBuf::from(dir),
        }
    }

    #[test]
    fn parse_accepts_aliases_and_case() {
        let parsed = LogSettings::parse(" WARNING ", "/tmp/logs").expect("warning should parse");
        assert_eq!(parsed, settings("warn", "/tmp/logs"));
        let parsed = LogSettings::parse("Debug", " /tmp/logs ").expect("Debug should parse");
        assert_eq!(parsed, settings("debug", "/tmp/logs"));
    }

    #[test]
    fn parse_rejects_unknown_level_and_bad_directory() {
        let error = LogSettings::parse("verbose", "/tmp/logs").expect_err("verbose is unknown");
        assert!(error.contains("verbose"));
        let error = LogSettings::parse("info", "  ").expect_err("blank dir must be rejected");
        assert!(error.contains("required"));
        let error = LogSettings::parse("info", "logs/dev").expect_err("relative dir must be rejected");
        assert!(error.contains("absolute"));
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        assert_eq!(one_line("a\nb\rcdefgh", 4), "a b ...");
        assert_eq!(one_line("short", 5), "short");
    }

    #[test]
    fn ensure_matches_reports_conflicts() {
        let active = settings("info", "/tmp/a");

        assert!(active.ensure_matches(&active.clone()).is_ok());
        let level_error = active
            .ensure_matches(&settings("debug", "/tmp/a"))
            .expect_err("level change should be refused");
        assert!(level_error.contains("level"));
        let dir_error = active
            .ensure_matches(&settings("info", "/tmp/b"))
            .expect_err("directory change should be refused");
        assert!(dir_error.contains("refusing to switch"));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_reconfiguration() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let dir_str = dir.path().to_str().expect("temp dir should be valid UTF-8");
        let other = tempfile::tempdir().expect("temp dir should be created");
        let other_str = other.path().to_str().expect("temp dir should be valid UTF-8");

        init_logging("info", dir_str).expect("first init should succeed");
        init_logging("INFO", dir_str).expect("same config should be idempotent");
        init_logging("debug", dir_str).expect_err("level conflict should fail");
        init_logging("info", other_str).expect_err("directory conflict should fail");

        let (level, active_dir) = logging_status().expect("logging should be active");
        assert_eq!(level, "info");
        assert_eq!(active_dir.as_path(), dir.path());
    }
}
