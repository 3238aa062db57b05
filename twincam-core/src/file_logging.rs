//! Run logging to a file through `log4rs`.
//!
//! Records go to the console and to `log_file`. Tool output logged under the
//! `ffmpeg_log` target is kept out of the console and only written to the
//! file.

use anyhow::Result;
use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";
const CONSOLE_PATTERN: &str = "{h({l})} {m}{n}";

fn build_config(log_file: &Path, log_level: LevelFilter) -> Result<Config> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_file)?;
    let console_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .logger(
            Logger::builder()
                .appender("file")
                .additive(false)
                .build("ffmpeg_log", log_level),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;
    Ok(config)
}

/// Installs the global logger. Can only succeed once per process.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    let config = build_config(log_file, log_level)?;
    log4rs::init_config(config)?;
    log::debug!("Logging to {}", log_file.display());
    Ok(())
}
