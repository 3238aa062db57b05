//! ffmpeg event handling for a single stage.
//!
//! Turns the tool's event stream into 0-100 integers on the stage's progress
//! channel, re-emits tool log lines through `log`, and keeps a short stderr
//! excerpt for error messages.

use crate::error::CoreResult;
use crate::external::is_non_critical_ffmpeg_message;
use crate::utils::{format_duration, parse_ffmpeg_time};
use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Lines of tool error output kept for the failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Highest percentage reported before the tool has exited successfully.
const RUNNING_CAP: u8 = 99;

/// Handler for the ffmpeg events of one stage invocation.
pub struct StageProgressHandler<'a> {
    label: String,
    known_total: Option<f64>,
    parsed_total: Option<f64>,
    extra_secs: f64,
    sender: &'a Sender<u8>,
    last_sent: Option<u8>,
    last_logged_threshold: i32,
    start_time: Instant,
    stderr_tail: VecDeque<String>,
    fatal: Option<String>,
}

impl<'a> StageProgressHandler<'a> {
    /// `known_total` is the expected output duration when the caller knows
    /// it up front (summed probe results for a re-encoding concatenation).
    /// Otherwise the handler uses the longest input duration the tool
    /// reports, plus `extra_secs` of output the stage adds itself (padding).
    pub fn new(
        label: impl Into<String>,
        known_total: Option<f64>,
        extra_secs: f64,
        sender: &'a Sender<u8>,
    ) -> Self {
        Self {
            label: label.into(),
            known_total: known_total.filter(|d| *d > 0.0),
            parsed_total: None,
            extra_secs,
            sender,
            last_sent: None,
            last_logged_threshold: -1,
            start_time: Instant::now(),
            stderr_tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
            fatal: None,
        }
    }

    pub fn handle_event(&mut self, event: FfmpegEvent) -> CoreResult<()> {
        match event {
            FfmpegEvent::ParsedDuration(d) => self.handle_duration(d.duration),
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress),
            FfmpegEvent::Log(level, message) => self.handle_log(&level, &message),
            FfmpegEvent::Error(error) => self.handle_error(&error),
            _ => {}
        }
        Ok(())
    }

    /// Expected output duration in seconds, if known yet.
    #[must_use]
    pub fn total_secs(&self) -> Option<f64> {
        self.known_total.or_else(|| {
            self.parsed_total
                .map(|d| d + self.extra_secs)
                .filter(|d| *d > 0.0)
        })
    }

    /// Last error lines written by the tool.
    #[must_use]
    pub fn stderr_excerpt(&self) -> String {
        self.stderr_tail
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The fatal message the tool logged, if any.
    #[must_use]
    pub fn fatal_message(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    fn handle_duration(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.parsed_total = Some(self.parsed_total.map_or(secs, |d| d.max(secs)));
        }
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) {
        let Some(current_secs) = parse_ffmpeg_time(&progress.time) else {
            return;
        };
        let Some(total) = self.total_secs() else {
            return;
        };

        let percent = (current_secs / total * 100.0).clamp(0.0, f64::from(RUNNING_CAP));
        let rounded = percent.floor() as u8;
        if self.last_sent.is_some_and(|last| rounded <= last) {
            return;
        }
        // The receiver is gone only when nobody tracks this stage's progress.
        let _ = self.sender.send(rounded);
        self.last_sent = Some(rounded);

        self.log_progress_if_needed(percent, current_secs, total, progress.speed);
    }

    fn log_progress_if_needed(&mut self, percent: f64, current_secs: f64, total: f64, speed: f32) {
        let threshold = (percent as i32 / 10) * 10;
        if threshold <= self.last_logged_threshold {
            return;
        }
        self.last_logged_threshold = threshold;

        let eta = if speed > 0.01 && total > current_secs {
            (total - current_secs) / f64::from(speed)
        } else {
            0.0
        };
        log::info!(
            target: "twincam::progress",
            "{}: {:.1}% | Time: {} / {} | Speed: {:.2}x | ETA: {} | Elapsed: {}",
            self.label,
            percent,
            format_duration(current_secs),
            format_duration(total),
            speed,
            format_duration(eta),
            format_duration(self.start_time.elapsed().as_secs_f64()),
        );
    }

    fn handle_log(&mut self, level: &FfmpegLogLevel, message: &str) {
        let log_level = map_ffmpeg_log_level(level);
        match level {
            FfmpegLogLevel::Fatal => {
                self.push_stderr(message);
                self.fatal = Some(message.to_string());
                log::error!(target: "ffmpeg_log", "{message}");
            }
            FfmpegLogLevel::Error if !is_non_critical_ffmpeg_message(message) => {
                self.push_stderr(message);
                log::error!(target: "ffmpeg_log", "{message}");
            }
            _ if log_level <= log::Level::Warn && !is_non_critical_ffmpeg_message(message) => {
                log::log!(target: "ffmpeg_log", log_level, "{message}");
            }
            _ => log::trace!(target: "ffmpeg_log", "{message}"),
        }
    }

    fn handle_error(&mut self, error: &str) {
        if is_non_critical_ffmpeg_message(error) {
            log::debug!("ffmpeg non-critical message: {error}");
        } else {
            log::warn!("ffmpeg reported: {error}");
        }
        self.push_stderr(error);
    }

    fn push_stderr(&mut self, line: &str) {
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line.trim_end().to_string());
    }
}

/// Maps ffmpeg's log level onto the `log` crate's.
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Info,
        _ => log::Level::Trace,
    }
}
