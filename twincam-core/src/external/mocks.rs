// twincam-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---
//
// Compiled for this crate's unit tests only. Everything is `Send + Sync`
// because stages run on job worker threads.

use super::{DurationProbe, FfmpegProcess, FfmpegSpawner};
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegDuration, FfmpegEvent, FfmpegProgress};
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

/// Mock implementation of FfmpegProcess.
#[derive(Clone, Debug)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        for event in self.events_to_emit.drain(..) {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
struct MockFfmpegExpectation {
    arg_pattern: String,
    result: CoreResult<MockFfmpegProcess>,
    create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// A call consumes the first expectation whose pattern is a substring of one
/// of the command's arguments. Unmatched calls fail with `CommandStart`.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.push(MockFfmpegExpectation {
                arg_pattern: arg_pattern.to_string(),
                result,
                create_dummy_output,
            });
        }
    }

    /// Expects a call that emits `events`, exits 0 and (optionally) writes a
    /// dummy file at the command's output path.
    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            exit_status: ExitStatus::from_raw(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    /// Expects a call that fails to spawn.
    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    /// Expects a call that emits `events` and exits with `exit_code`.
    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: events,
            // wait(2) status encoding: exit code lives in the high byte
            exit_status: ExitStatus::from_raw(exit_code << 8),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    /// Argument lists of every spawn, in call order.
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of expectations not yet consumed.
    pub fn pending_expectations(&self) -> usize {
        self.expectations.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        if let Ok(mut calls) = self.received_calls.lock() {
            calls.push(args.clone());
        }

        let expectation = {
            let mut expectations = self
                .expectations
                .lock()
                .map_err(|_| CoreError::OperationFailed("mock spawner poisoned".to_string()))?;
            let found_index = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            found_index.map(|index| expectations.remove(index))
        };

        let Some(expectation) = expectation else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {args:?}");
            return Err(CoreError::CommandStart(
                "ffmpeg (mock)".to_string(),
                std::io::Error::other(format!("unexpected call: {args:?}")),
            ));
        };
        log::debug!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        let process = expectation.result?;
        if expectation.create_dummy_output {
            if let Some(output_path) = args.last().map(PathBuf::from) {
                if let Some(parent) = output_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&output_path, b"mock output")?;
            }
        }
        Ok(process)
    }
}

/// Mock implementation of DurationProbe.
#[derive(Clone, Default)]
pub struct MockDurationProbe {
    durations: Arc<Mutex<HashMap<PathBuf, Option<f64>>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockDurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the duration returned for `path`.
    pub fn expect_duration(&self, path: &Path, secs: f64) {
        if let Ok(mut durations) = self.durations.lock() {
            durations.insert(path.to_path_buf(), Some(secs));
        }
    }

    /// Scripts a probe failure for `path`.
    pub fn expect_failure(&self, path: &Path) {
        if let Ok(mut durations) = self.durations.lock() {
            durations.insert(path.to_path_buf(), None);
        }
    }

    /// Paths probed so far, in call order.
    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl DurationProbe for MockDurationProbe {
    fn duration(&self, path: &Path) -> CoreResult<f64> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(path.to_path_buf());
        }
        let scripted = self
            .durations
            .lock()
            .ok()
            .and_then(|d| d.get(path).copied());
        match scripted {
            Some(Some(secs)) => Ok(secs),
            Some(None) => Err(CoreError::ProbeFailure(format!(
                "{}: scripted failure",
                path.display()
            ))),
            None => Err(CoreError::ProbeFailure(format!(
                "{}: no duration scripted",
                path.display()
            ))),
        }
    }
}

/// A progress event as ffmpeg-sidecar would parse it from a stats line.
pub fn progress_event(time: &str) -> FfmpegEvent {
    FfmpegEvent::Progress(FfmpegProgress {
        frame: 0,
        fps: 30.0,
        q: 0.0,
        size_kb: 0,
        time: time.to_string(),
        bitrate_kbps: 0.0,
        speed: 1.0,
        raw_log_message: String::new(),
    })
}

/// The `Duration: ...` line ffmpeg prints for input `input_index`.
pub fn duration_event(input_index: u32, secs: f64) -> FfmpegEvent {
    FfmpegEvent::ParsedDuration(FfmpegDuration {
        input_index,
        duration: secs,
        raw_log_message: String::new(),
    })
}
