// ============================================================================
// twincam-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: console logging through env_logger, or console + run log
// file through the core's log4rs setup when a log directory is given.
//
// USAGE:
// - RUST_LOG=info (default): normal operation logs
// - RUST_LOG=debug or --verbose: tool command lines and stage details

use crate::error::CliResult;
use log::LevelFilter;
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use twincam_core::CoreError;
use twincam_core::file_logging::setup_file_logging;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Name of the log file for a run started now.
pub fn run_log_file_name() -> String {
    format!("twincam_run_{}.log", get_timestamp())
}

/// Initializes logging for the process and returns the run log path, if any.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> CliResult<Option<PathBuf>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match log_dir {
        Some(dir) => {
            let log_file = dir.join(run_log_file_name());
            setup_file_logging(&log_file, level).map_err(|e| {
                CoreError::OperationFailed(format!(
                    "Failed to set up logging to {}: {e:#}",
                    log_file.display()
                ))
            })?;
            Ok(Some(log_file))
        }
        None => {
            init_console(level);
            Ok(None)
        }
    }
}

fn init_console(level: LevelFilter) {
    let use_color = std::env::var_os("NO_COLOR").is_none();
    let result = env_logger::Builder::new()
        .filter_level(level)
        // Tool stderr is only interesting in the run log file
        .filter_module("ffmpeg_log", LevelFilter::Warn)
        .parse_default_env()
        .format(move |buf, record| {
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };
            if !use_color {
                return writeln!(buf, "{level_str} {}", record.args());
            }
            match record.level() {
                log::Level::Error => writeln!(buf, "{} {}", level_str.bright_red(), record.args()),
                log::Level::Warn => writeln!(buf, "{} {}", level_str.yellow(), record.args()),
                log::Level::Info => writeln!(buf, "{} {}", level_str.green(), record.args()),
                log::Level::Debug => writeln!(buf, "{} {}", level_str.blue(), record.args()),
                log::Level::Trace => writeln!(buf, "{} {}", level_str.magenta(), record.args()),
            }
        })
        .try_init();
    if result.is_err() {
        // A logger is already installed (e.g. in tests)
        log::debug!("Console logger already initialized");
    }
}
